/// spec §3: app_context_tag is one of these six fixed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppContextTag {
    Email,
    Chat,
    Code,
    Document,
    Browser,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Formal,
    Casual,
    Technical,
}

impl AppContextTag {
    pub fn as_str(self) -> &'static str {
        match self {
            AppContextTag::Email => "email",
            AppContextTag::Chat => "chat",
            AppContextTag::Code => "code",
            AppContextTag::Document => "document",
            AppContextTag::Browser => "browser",
            AppContextTag::General => "general",
        }
    }
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Casual => "casual",
            Tone::Technical => "technical",
        }
    }
}

/// Known program tokens, lowercased, mapped to `(tag, tone)` (spec §4.4 step 1).
const PROCESS_TABLE: &[(&str, AppContextTag, Tone)] = &[
    ("thunderbird", AppContextTag::Email, Tone::Formal),
    ("outlook", AppContextTag::Email, Tone::Formal),
    ("evolution", AppContextTag::Email, Tone::Formal),
    ("slack", AppContextTag::Chat, Tone::Casual),
    ("discord", AppContextTag::Chat, Tone::Casual),
    ("telegram", AppContextTag::Chat, Tone::Casual),
    ("signal", AppContextTag::Chat, Tone::Casual),
    ("code", AppContextTag::Code, Tone::Technical),
    ("code-insiders", AppContextTag::Code, Tone::Technical),
    ("jetbrains-idea", AppContextTag::Code, Tone::Technical),
    ("nvim", AppContextTag::Code, Tone::Technical),
    ("vim", AppContextTag::Code, Tone::Technical),
    ("sublime_text", AppContextTag::Code, Tone::Technical),
    ("libreoffice-writer", AppContextTag::Document, Tone::Formal),
    ("soffice", AppContextTag::Document, Tone::Formal),
    ("obsidian", AppContextTag::Document, Tone::Casual),
    ("notion", AppContextTag::Document, Tone::Casual),
    ("firefox", AppContextTag::Browser, Tone::Formal),
    ("chromium", AppContextTag::Browser, Tone::Formal),
    ("google-chrome", AppContextTag::Browser, Tone::Formal),
    ("brave-browser", AppContextTag::Browser, Tone::Formal),
    ("msedge", AppContextTag::Browser, Tone::Formal),
];

/// URL/title substrings, refining a browser's tag/tone (spec §4.4 step 2/3).
const URL_FRAGMENT_TABLE: &[(&str, AppContextTag, Tone)] = &[
    ("gmail", AppContextTag::Email, Tone::Formal),
    ("outlook.com", AppContextTag::Email, Tone::Formal),
    ("mail.google", AppContextTag::Email, Tone::Formal),
    ("github", AppContextTag::Code, Tone::Technical),
    ("gitlab", AppContextTag::Code, Tone::Technical),
    ("stackoverflow", AppContextTag::Code, Tone::Technical),
    ("slack.com", AppContextTag::Chat, Tone::Casual),
    ("discord.com", AppContextTag::Chat, Tone::Casual),
    ("docs.google", AppContextTag::Document, Tone::Formal),
    ("notion.so", AppContextTag::Document, Tone::Casual),
];

/// spec §4.4's four-step classification algorithm.
pub fn classify(process_name: &str, window_title: &str) -> (AppContextTag, Tone) {
    let process_lower = process_name.to_lowercase();
    let title_lower = window_title.to_lowercase();

    let process_match = PROCESS_TABLE
        .iter()
        .find(|(token, ..)| process_lower.contains(token))
        .map(|(_, tag, tone)| (*tag, *tone));

    match process_match {
        Some((AppContextTag::Browser, tone)) => {
            match_url_fragment(&title_lower).unwrap_or((AppContextTag::Browser, tone))
        }
        Some(hit) => hit,
        None => match_url_fragment(&title_lower).unwrap_or((AppContextTag::General, Tone::Formal)),
    }
}

fn match_url_fragment(title_lower: &str) -> Option<(AppContextTag, Tone)> {
    URL_FRAGMENT_TABLE
        .iter()
        .find(|(fragment, ..)| title_lower.contains(fragment))
        .map(|(_, tag, tone)| (*tag, *tone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_process_maps_directly() {
        let (tag, tone) = classify("slack", "general channel");
        assert_eq!(tag, AppContextTag::Chat);
        assert_eq!(tone, Tone::Casual);
    }

    #[test]
    fn browser_refines_via_url_fragment() {
        let (tag, _) = classify("firefox", "Inbox (3) - Gmail");
        assert_eq!(tag, AppContextTag::Email);
    }

    #[test]
    fn browser_without_fragment_match_stays_browser() {
        let (tag, _) = classify("firefox", "Example Domain");
        assert_eq!(tag, AppContextTag::Browser);
    }

    #[test]
    fn unknown_process_falls_back_to_title_fragment() {
        let (tag, _) = classify("some-custom-shell", "Pull request #42 · github");
        assert_eq!(tag, AppContextTag::Code);
    }

    #[test]
    fn no_match_defaults_to_general_formal() {
        let (tag, tone) = classify("totally-unknown-app", "nothing interesting");
        assert_eq!(tag, AppContextTag::General);
        assert_eq!(tone, Tone::Formal);
    }
}
