//! Static site and application knowledge tables.
//!
//! Pure data: normalized names mapped to canonical URLs or launch targets.
//! A miss here is a first-class outcome — callers ask the user for the
//! exact address instead of guessing.

/// Known sites, normalized name -> canonical URL.
const DOMAIN_TABLE: &[(&str, &str)] = &[
    // Shopping
    ("olx", "https://www.olx.com.pk"),
    ("daraz", "https://www.daraz.pk"),
    ("amazon", "https://www.amazon.com"),
    ("ebay", "https://www.ebay.com"),
    ("aliexpress", "https://www.aliexpress.com"),
    // Social
    ("facebook", "https://www.facebook.com"),
    ("twitter", "https://twitter.com"),
    ("x", "https://twitter.com"),
    ("instagram", "https://www.instagram.com"),
    ("linkedin", "https://www.linkedin.com"),
    ("reddit", "https://www.reddit.com"),
    ("pinterest", "https://www.pinterest.com"),
    ("tiktok", "https://www.tiktok.com"),
    ("snapchat", "https://www.snapchat.com"),
    // Video / streaming
    ("youtube", "https://www.youtube.com"),
    ("netflix", "https://www.netflix.com"),
    ("twitch", "https://www.twitch.tv"),
    ("hulu", "https://www.hulu.com"),
    ("disney", "https://www.disneyplus.com"),
    ("prime video", "https://www.primevideo.com"),
    // Productivity
    ("google", "https://www.google.com"),
    ("gmail", "https://mail.google.com"),
    ("google drive", "https://drive.google.com"),
    ("google docs", "https://docs.google.com"),
    ("outlook", "https://outlook.live.com"),
    ("notion", "https://www.notion.so"),
    ("trello", "https://trello.com"),
    // Dev
    ("github", "https://github.com"),
    ("gitlab", "https://gitlab.com"),
    ("stackoverflow", "https://stackoverflow.com"),
    ("stack overflow", "https://stackoverflow.com"),
    ("chatgpt", "https://chat.openai.com"),
    ("chat gpt", "https://chat.openai.com"),
    ("openai", "https://www.openai.com"),
    ("claude", "https://claude.ai"),
    // Communication
    ("discord", "https://discord.com/app"),
    ("slack", "https://slack.com"),
    ("whatsapp", "https://web.whatsapp.com"),
    ("whatsapp web", "https://web.whatsapp.com"),
    ("telegram", "https://web.telegram.org"),
    ("zoom", "https://zoom.us"),
    ("teams", "https://teams.microsoft.com"),
    // Music
    ("spotify", "https://open.spotify.com"),
    ("soundcloud", "https://soundcloud.com"),
    ("apple music", "https://music.apple.com"),
    // News
    ("wikipedia", "https://www.wikipedia.org"),
    ("bbc", "https://www.bbc.com"),
    ("cnn", "https://www.cnn.com"),
    // Other
    ("canva", "https://www.canva.com"),
    ("figma", "https://www.figma.com"),
];

/// Known local applications, spoken name -> launch target.
const APP_TABLE: &[(&str, &str)] = &[
    ("notepad", "notepad"),
    ("calculator", "calc"),
    ("calc", "calc"),
    ("explorer", "explorer"),
    ("file explorer", "explorer"),
    ("files", "explorer"),
    ("settings", "ms-settings:"),
    ("word", "winword"),
    ("excel", "excel"),
    ("powerpoint", "powerpnt"),
    ("chrome", "chrome"),
    ("brave", "brave"),
    ("firefox", "firefox"),
    ("vscode", "code"),
    ("vs code", "code"),
    ("code", "code"),
    ("terminal", "wt"),
    ("cmd", "cmd"),
    ("powershell", "powershell"),
    ("task manager", "taskmgr"),
];

/// Resolve a normalized site name to its canonical URL.
pub fn canonical_url(name: &str) -> Option<&'static str> {
    let name = name.trim();
    DOMAIN_TABLE
        .iter()
        .find(|(site, _)| *site == name)
        .map(|(_, url)| *url)
}

/// Resolve a spoken app name to its launch target.
pub fn app_launch_target(name: &str) -> Option<&'static str> {
    let name = name.trim();
    APP_TABLE
        .iter()
        .find(|(app, _)| *app == name)
        .map(|(_, cmd)| *cmd)
}

pub fn is_known_site(name: &str) -> bool {
    canonical_url(name).is_some()
}

pub fn is_known_app(name: &str) -> bool {
    app_launch_target(name).is_some()
}

/// TLD-like suffixes that make a bare target look like a domain the user
/// spelled out themselves.
const TLD_SUFFIXES: &[&str] = &[
    ".com", ".org", ".net", ".pk", ".io", ".ai", ".dev", ".co",
];

/// Whether the target already looks like a full domain ("example.com").
pub fn looks_like_domain(target: &str) -> bool {
    let target = target.trim();
    TLD_SUFFIXES.iter().any(|suffix| target.ends_with(suffix))
}
