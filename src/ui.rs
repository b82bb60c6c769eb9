use crate::models::{Counter, Language, LocalCounters, Theme};

/// Where the page script reads and writes counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Served by the axum app; counts go through `/api/tributes`.
    Server,
    /// Packaged static page; counts live in browser local storage.
    Local,
}

impl PageMode {
    fn as_str(self) -> &'static str {
        match self {
            PageMode::Server => "server",
            PageMode::Local => "local",
        }
    }
}

struct Content {
    html_lang: &'static str,
    title: &'static str,
    subtitle: &'static str,
    dates: &'static str,
    quote: &'static str,
    biography_title: &'static str,
    biography: &'static [&'static str],
    achievements_title: &'static str,
    achievements: &'static [&'static str],
    legacy_title: &'static str,
    legacy: &'static str,
    tribute_title: &'static str,
    candle: &'static str,
    flower: &'static str,
    sent: &'static str,
    refresh: &'static str,
    loading: &'static str,
    send_failed: &'static str,
    footer: &'static str,
}

static ZH: Content = Content {
    html_lang: "zh-CN",
    title: "杨振宁先生",
    subtitle: "纪念页",
    dates: "1922年10月1日 - 2025年",
    quote: "我希望年轻人不要把科学看得太神秘，科学就是追求真理的道路。",
    biography_title: "生平简介",
    biography: &[
        "杨振宁（Chen-Ning Franklin Yang），1922年生于安徽合肥，理论物理学家，诺贝尔物理学奖获得者。",
        "1942年毕业于西南联合大学物理系，1944年获清华大学硕士学位。1948年获芝加哥大学博士学位，师从恩里科·费米。",
        "1957年，杨振宁与李政道因\"弱相互作用中宇称不守恒\"理论获得诺贝尔物理学奖，成为首位获得诺贝尔奖的华人。",
        "杨振宁的研究涵盖粒子物理、统计力学和凝聚态物理等多个领域，对20世纪理论物理学的发展做出了重大贡献。",
    ],
    achievements_title: "主要成就",
    achievements: &[
        "1956年：与李政道提出弱相互作用中宇称不守恒定律",
        "1957年：获诺贝尔物理学奖（年仅35岁）",
        "杨-米尔斯规范场论（Yang-Mills Theory）- 现代物理学的基石",
        "杨-巴克斯特方程（Yang-Baxter Equation）",
        "在统计力学、凝聚态物理等领域的开创性工作",
        "培养和影响了多代物理学家",
    ],
    legacy_title: "永恒的贡献",
    legacy: "杨振宁先生不仅是杰出的理论物理学家，更是连接中西方科学界的桥梁。他对祖国的深厚感情和对科学教育的无私奉献，激励着无数后辈学者。他的学术成就和人格魅力将永远铭记在科学史册上。",
    tribute_title: "寄托哀思",
    candle: "送上蜡烛",
    flower: "送上鲜花",
    sent: "已送出",
    refresh: "刷新数据",
    loading: "加载中...",
    send_failed: "发送失败",
    footer: "永远缅怀",
};

static EN: Content = Content {
    html_lang: "en",
    title: "Professor Chen-Ning Yang",
    subtitle: "In Memoriam",
    dates: "October 1, 1922 - 2025",
    quote: "I hope young people do not see science as too mysterious. Science is simply the path to pursue truth.",
    biography_title: "Biography",
    biography: &[
        "Chen-Ning Franklin Yang, born in 1922 in Hefei, Anhui, was a renowned theoretical physicist and Nobel Prize laureate.",
        "He graduated from National Southwest Associated University in 1942 and received his Master's degree from Tsinghua University in 1944. In 1948, he earned his Ph.D. from the University of Chicago under Enrico Fermi.",
        "In 1957, Yang and Tsung-Dao Lee were awarded the Nobel Prize in Physics for their work on parity non-conservation in weak interactions, making Yang the first Chinese Nobel laureate.",
        "Yang's research spanned particle physics, statistical mechanics, and condensed matter physics, making profound contributions to 20th-century theoretical physics.",
    ],
    achievements_title: "Major Achievements",
    achievements: &[
        "1956: Proposed parity non-conservation in weak interactions with T.D. Lee",
        "1957: Nobel Prize in Physics (at age 35)",
        "Yang-Mills Gauge Theory - Foundation of modern physics",
        "Yang-Baxter Equation",
        "Pioneering work in statistical mechanics and condensed matter physics",
        "Mentored and influenced generations of physicists",
    ],
    legacy_title: "Lasting Legacy",
    legacy: "Professor Yang was not only an outstanding theoretical physicist but also a bridge connecting scientific communities between East and West. His deep affection for his homeland and selfless dedication to science education inspired countless scholars. His academic achievements and personal integrity will be forever remembered in the annals of science.",
    tribute_title: "Pay Tribute",
    candle: "Light a Candle",
    flower: "Send Flowers",
    sent: "Sent",
    refresh: "Refresh",
    loading: "Loading...",
    send_failed: "Failed to send",
    footer: "Forever Remembered",
};

fn content(lang: Language) -> &'static Content {
    match lang {
        Language::Zh => &ZH,
        Language::En => &EN,
    }
}

pub fn render_index(
    lang: Language,
    theme: Theme,
    counters: &LocalCounters,
    mode: PageMode,
) -> String {
    let t = content(lang);
    let paragraphs: String = t
        .biography
        .iter()
        .map(|p| format!("<p>{}</p>", escape(p)))
        .collect();
    let achievements: String = t
        .achievements
        .iter()
        .map(|item| format!("<li>{}</li>", escape(item)))
        .collect();
    let theme_class = match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    };
    // Static pages live at index.html and en/index.html.
    let (zh_href, en_href, theme_href) = match (mode, lang) {
        (PageMode::Server, _) => {
            let toggled = if theme == Theme::Dark { "light" } else { "dark" };
            let lang_code = if lang == Language::En { "en" } else { "zh" };
            (
                format!("/?lang=zh&theme={theme_class}"),
                format!("/?lang=en&theme={theme_class}"),
                format!("/?lang={lang_code}&theme={toggled}"),
            )
        }
        (PageMode::Local, Language::Zh) => {
            ("index.html".to_string(), "en/index.html".to_string(), "#".to_string())
        }
        (PageMode::Local, Language::En) => {
            ("../index.html".to_string(), "index.html".to_string(), "#".to_string())
        }
    };

    INDEX_HTML
        .replace("{{LANG}}", t.html_lang)
        .replace("{{THEME}}", theme_class)
        .replace("{{MODE}}", mode.as_str())
        .replace("{{ZH_HREF}}", &zh_href)
        .replace("{{EN_HREF}}", &en_href)
        .replace("{{THEME_HREF}}", &theme_href)
        .replace("{{TITLE}}", &escape(t.title))
        .replace("{{SUBTITLE}}", &escape(t.subtitle))
        .replace("{{DATES}}", &escape(t.dates))
        .replace("{{QUOTE}}", &escape(t.quote))
        .replace("{{BIO_TITLE}}", &escape(t.biography_title))
        .replace("{{BIO}}", &paragraphs)
        .replace("{{ACH_TITLE}}", &escape(t.achievements_title))
        .replace("{{ACH}}", &achievements)
        .replace("{{LEGACY_TITLE}}", &escape(t.legacy_title))
        .replace("{{LEGACY}}", &escape(t.legacy))
        .replace("{{TRIBUTE_TITLE}}", &escape(t.tribute_title))
        .replace("{{CANDLE}}", &escape(t.candle))
        .replace("{{FLOWER}}", &escape(t.flower))
        .replace("{{SENT}}", &escape(t.sent))
        .replace("{{REFRESH}}", &escape(t.refresh))
        .replace("{{LOADING}}", &escape(t.loading))
        .replace("{{SEND_FAILED}}", &escape(t.send_failed))
        .replace("{{FOOTER}}", &escape(t.footer))
        .replace("{{CANDLES_KEY}}", Counter::Candles.key())
        .replace("{{FLOWERS_KEY}}", Counter::Flowers.key())
        .replace("{{CANDLES_DEFAULT}}", &Counter::Candles.default_count().to_string())
        .replace("{{FLOWERS_DEFAULT}}", &Counter::Flowers.default_count().to_string())
        .replace("{{CANDLES}}", &counters.candles.to_string())
        .replace("{{FLOWERS}}", &counters.flowers.to_string())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="{{LANG}}">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · {{SUBTITLE}}</title>
  <style>
    :root {
      --bg: linear-gradient(135deg, #f8fafc, #f1f5f9 50%, #e2e8f0);
      --ink: #0f172a;
      --muted: #475569;
      --card: rgba(255, 255, 255, 0.82);
      --border: #e2e8f0;
      --candle: #fffbeb;
      --candle-border: #fcd34d;
      --flower: #fff1f2;
      --flower-border: #fda4af;
    }

    body.dark {
      --bg: linear-gradient(135deg, #0f172a, #1e293b 50%, #0f172a);
      --ink: #f1f5f9;
      --muted: #cbd5e1;
      --card: rgba(30, 41, 59, 0.82);
      --border: #334155;
      --candle: rgba(120, 53, 15, 0.4);
      --candle-border: #b45309;
      --flower: rgba(136, 19, 55, 0.4);
      --flower-border: #be123c;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Noto Serif SC", "Georgia", serif;
    }

    .page { max-width: 880px; margin: 0 auto; padding: 64px 24px; display: grid; gap: 40px; }

    .toolbar { display: flex; justify-content: flex-end; gap: 8px; }
    .toolbar a {
      padding: 8px 14px;
      border-radius: 8px;
      background: var(--card);
      border: 1px solid var(--border);
      color: var(--ink);
      text-decoration: none;
      font-family: sans-serif;
      font-size: 0.9rem;
    }

    header { text-align: center; }
    .seal {
      width: 128px;
      height: 128px;
      margin: 0 auto 32px;
      border-radius: 50%;
      background: linear-gradient(135deg, #334155, #0f172a);
      color: white;
      display: grid;
      place-items: center;
      font-size: 3rem;
    }
    h1 { font-size: clamp(2.2rem, 5vw, 3rem); margin: 0 0 12px; }
    .subtitle { color: var(--muted); font-size: 1.25rem; margin: 0 0 8px; }
    .dates { color: var(--muted); margin: 0 0 32px; }
    blockquote { max-width: 640px; margin: 0 auto; font-style: italic; border-left: 4px solid var(--border); padding: 8px 24px; text-align: left; }

    section {
      background: var(--card);
      border: 1px solid var(--border);
      border-radius: 18px;
      padding: 32px;
      box-shadow: 0 20px 40px rgba(15, 23, 42, 0.08);
    }
    section h2 { margin-top: 0; border-bottom: 2px solid var(--border); padding-bottom: 12px; }
    section p, section li { line-height: 1.7; color: var(--muted); font-size: 1.05rem; }

    .tributes h2 { text-align: center; border: none; }
    .tribute-actions { display: flex; flex-wrap: wrap; justify-content: center; gap: 24px; }
    .tribute {
      appearance: none;
      min-width: 200px;
      padding: 24px 32px;
      border-radius: 14px;
      cursor: pointer;
      display: grid;
      gap: 8px;
      justify-items: center;
      font: inherit;
      color: var(--ink);
      transition: transform 150ms ease;
    }
    .tribute:hover { transform: scale(1.04); }
    .tribute:disabled { opacity: 0.5; cursor: not-allowed; }
    .tribute .icon { font-size: 2.5rem; }
    .tribute .count { color: var(--muted); font-size: 0.9rem; }
    .tribute.candle { background: var(--candle); border: 2px solid var(--candle-border); }
    .tribute.flower { background: var(--flower); border: 2px solid var(--flower-border); }
    .refresh { display: block; margin: 0 auto 24px; font: inherit; font-size: 0.85rem; padding: 4px 12px; border-radius: 6px; cursor: pointer; }
    .status { min-height: 1.2em; text-align: center; color: #ef4444; font-size: 0.9rem; margin-bottom: 16px; }

    footer { text-align: center; color: var(--muted); font-size: 0.9rem; }
  </style>
</head>
<body class="{{THEME}}">
  <main class="page">
    <nav class="toolbar">
      <a id="theme-toggle" href="{{THEME_HREF}}">☾ / ☀</a>
      <a href="{{ZH_HREF}}">中文</a>
      <a href="{{EN_HREF}}">English</a>
    </nav>

    <header>
      <div class="seal">杨</div>
      <h1>{{TITLE}}</h1>
      <p class="subtitle">{{SUBTITLE}}</p>
      <p class="dates">{{DATES}}</p>
      <blockquote>"{{QUOTE}}"</blockquote>
    </header>

    <section>
      <h2>{{BIO_TITLE}}</h2>
      {{BIO}}
    </section>

    <section>
      <h2>{{ACH_TITLE}}</h2>
      <ul>{{ACH}}</ul>
    </section>

    <section>
      <h2>{{LEGACY_TITLE}}</h2>
      <p>{{LEGACY}}</p>
    </section>

    <section class="tributes">
      <h2>{{TRIBUTE_TITLE}}</h2>
      <div class="status" id="status"></div>
      <button class="refresh" id="refresh" type="button">{{REFRESH}}</button>
      <div class="tribute-actions">
        <form method="post" action="/tribute/candle" data-kind="candle">
          <button class="tribute candle" type="submit">
            <span class="icon">🕯️</span>
            <span>{{CANDLE}}</span>
            <span class="count">{{SENT}}: <span id="candles">{{CANDLES}}</span></span>
          </button>
        </form>
        <form method="post" action="/tribute/flower" data-kind="flower">
          <button class="tribute flower" type="submit">
            <span class="icon">💐</span>
            <span>{{FLOWER}}</span>
            <span class="count">{{SENT}}: <span id="flowers">{{FLOWERS}}</span></span>
          </button>
        </form>
      </div>
    </section>

    <footer>© 2025 | {{FOOTER}}</footer>
  </main>

  <script>
    const MODE = '{{MODE}}';
    const KEYS = { candle: '{{CANDLES_KEY}}', flower: '{{FLOWERS_KEY}}' };
    const DEFAULTS = { candle: {{CANDLES_DEFAULT}}, flower: {{FLOWERS_DEFAULT}} };

    const statusEl = document.getElementById('status');
    const refreshEl = document.getElementById('refresh');
    const countEls = {
      candle: document.getElementById('candles'),
      flower: document.getElementById('flowers')
    };
    const buttons = Array.from(document.querySelectorAll('.tribute'));

    const setError = (message) => {
      statusEl.textContent = message || '';
    };

    const render = (counts) => {
      countEls.candle.textContent = counts.candles.toLocaleString();
      countEls.flower.textContent = counts.flowers.toLocaleString();
    };

    const readLocal = (kind) => {
      const raw = window.localStorage.getItem(KEYS[kind]);
      if (raw === null || !/^\s*\d+\s*$/.test(raw)) {
        return DEFAULTS[kind];
      }
      return parseInt(raw, 10);
    };

    const localCounts = () => ({ candles: readLocal('candle'), flowers: readLocal('flower') });

    const fetchCounts = async () => {
      if (MODE === 'local') {
        return localCounts();
      }
      const res = await fetch('/api/tributes');
      if (!res.ok) {
        throw new Error(await res.text() || 'refresh failed');
      }
      return res.json();
    };

    const sendTribute = async (kind) => {
      if (MODE === 'local') {
        const next = readLocal(kind) + 1;
        window.localStorage.setItem(KEYS[kind], next.toString());
        return localCounts();
      }
      const res = await fetch('/api/tributes', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ kind })
      });
      if (!res.ok) {
        throw new Error(await res.text() || 'send failed');
      }
      return res.json();
    };

    const refresh = async () => {
      refreshEl.disabled = true;
      refreshEl.textContent = '{{LOADING}}';
      try {
        render(await fetchCounts());
        setError('');
      } catch (err) {
        setError(err.message);
      } finally {
        refreshEl.disabled = false;
        refreshEl.textContent = '{{REFRESH}}';
      }
    };

    document.querySelectorAll('form[data-kind]').forEach((form) => {
      form.addEventListener('submit', (event) => {
        event.preventDefault();
        const kind = form.dataset.kind;
        buttons.forEach((button) => { button.disabled = true; });
        sendTribute(kind)
          .then((counts) => {
            render(counts);
            setError('');
          })
          .catch((err) => setError(`{{SEND_FAILED}}: ${err.message}`))
          .finally(() => {
            setTimeout(() => buttons.forEach((button) => { button.disabled = false; }), 1000);
          });
      });
    });

    if (MODE === 'local') {
      const toggle = document.getElementById('theme-toggle');
      toggle.addEventListener('click', (event) => {
        event.preventDefault();
        document.body.classList.toggle('dark');
        document.body.classList.toggle('light');
      });
    }

    refreshEl.addEventListener('click', refresh);
    refresh();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counts_and_language() {
        let counters = LocalCounters { candles: 51, flowers: 20 };
        let html = render_index(Language::En, Theme::Dark, &counters, PageMode::Server);

        assert!(html.contains(r#"<html lang="en">"#));
        assert!(html.contains(r#"<body class="dark">"#));
        assert!(html.contains(r#"<span id="candles">51</span>"#));
        assert!(html.contains("Light a Candle"));
        assert!(html.contains("const MODE = 'server';"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn local_page_uses_storage_keys_and_defaults() {
        let html = render_index(
            Language::Zh,
            Theme::Light,
            &LocalCounters::default(),
            PageMode::Local,
        );

        assert!(html.contains("const MODE = 'local';"));
        assert!(html.contains("candle: 'yzn_candles'"));
        assert!(html.contains("flower: 20"));
        assert!(html.contains("送上蜡烛"));
        assert!(!html.contains("{{"));
    }
}
