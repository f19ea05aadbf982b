use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::types::Platform;

struct PlatformPattern {
    platform: Platform,
    regex: LazyLock<Regex>,
}

macro_rules! platform_pattern {
    ($platform:expr, $re:literal) => {
        PlatformPattern {
            platform: $platform,
            regex: LazyLock::new(|| Regex::new($re).unwrap()),
        }
    };
}

/// Ordered host patterns; the first match wins.
static PLATFORM_PATTERNS: [PlatformPattern; 9] = [
    platform_pattern!(Platform::Youtube, r"(?i)(?:^|\.)(?:youtube\.com|youtu\.be)$"),
    platform_pattern!(Platform::Soundcloud, r"(?i)(?:^|\.)soundcloud\.com$"),
    platform_pattern!(Platform::Patreon, r"(?i)(?:^|\.)patreon\.com$"),
    platform_pattern!(Platform::Reddit, r"(?i)(?:^|\.)reddit\.com$"),
    platform_pattern!(Platform::Discord, r"(?i)(?:^|\.)discord\.(?:gg|com)$"),
    platform_pattern!(Platform::Twitter, r"(?i)(?:^|\.)(?:twitter\.com|x\.com)$"),
    platform_pattern!(Platform::Bambicloud, r"(?i)bambicloud"),
    platform_pattern!(Platform::Hypnotube, r"(?i)hypnotube"),
    platform_pattern!(Platform::Vimeo, r"(?i)(?:^|\.)vimeo\.com$"),
];

/// Map a URL onto the platform it belongs to.
///
/// Scheme-less input such as `youtu.be/abc` is accepted. Missing, empty or
/// unparseable input yields `None`.
pub fn detect_platform(url: Option<&str>) -> Option<Platform> {
    let host = host_of(url?.trim())?;

    PLATFORM_PATTERNS
        .iter()
        .find(|pattern| pattern.regex.is_match(&host))
        .map(|pattern| pattern.platform)
}

fn host_of(url: &str) -> Option<String> {
    if url.is_empty() || url.chars().any(char::is_whitespace) {
        return None;
    }

    let parsed = if url.contains("://") {
        Url::parse(url).ok()?
    } else {
        Url::parse(&format!("https://{url}")).ok()?
    };

    let host = parsed.host_str()?;
    // Bare words ("hello") parse as single-label hosts; real sites have a dot.
    if !host.contains('.') {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_platforms() {
        let cases = [
            ("https://www.youtube.com/watch?v=abc", Platform::Youtube),
            ("https://youtu.be/abc", Platform::Youtube),
            ("https://soundcloud.com/bambi-sleep-audio", Platform::Soundcloud),
            ("https://www.patreon.com/creator", Platform::Patreon),
            ("https://old.reddit.com/r/test", Platform::Reddit),
            ("https://discord.gg/invite", Platform::Discord),
            ("https://x.com/someone", Platform::Twitter),
            ("https://bambicloud.com/file/1", Platform::Bambicloud),
            ("https://hypnotube.com/video/1", Platform::Hypnotube),
            ("https://vimeo.com/123", Platform::Vimeo),
        ];

        for (url, expected) in cases {
            assert_eq!(detect_platform(Some(url)), Some(expected), "url: {url}");
        }
    }

    #[test]
    fn test_scheme_less_url() {
        assert_eq!(detect_platform(Some("youtube.com/watch")), Some(Platform::Youtube));
    }

    #[test]
    fn test_lookalike_hosts_do_not_match() {
        assert_eq!(detect_platform(Some("https://box.com/file")), None);
        assert_eq!(
            detect_platform(Some("https://example.com/?ref=youtube.com")),
            None
        );
    }

    #[test]
    fn test_platform_name_in_path_is_not_a_host() {
        assert_eq!(detect_platform(Some("https://mirror.example/hypnotube/v/1")), None);
        assert_eq!(detect_platform(Some("https://cdn.example/bambicloud/f/1")), None);
        assert_eq!(
            detect_platform(Some("https://www.hypnotube.com/v/1")),
            Some(Platform::Hypnotube)
        );
    }

    #[test]
    fn test_invalid_input_is_none() {
        assert_eq!(detect_platform(None), None);
        assert_eq!(detect_platform(Some("")), None);
        assert_eq!(detect_platform(Some("not a url")), None);
        assert_eq!(detect_platform(Some("hello")), None);
        assert_eq!(detect_platform(Some("http://")), None);
    }
}
