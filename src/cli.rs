use clap::Parser;
use std::path::PathBuf;

use crate::domain::languages::{parse_language_list, LanguageList};

const EXAMPLES: &str = "Examples:
    Grab Spanish subtitles for all media under /media/tv:
    > subsgrab /media/tv es
    Grab subtitles in languages (by priority) English, Spanish, French:
    > subsgrab /media/tv en,es,fr";

#[derive(Parser)]
#[command(name = "subsgrab")]
#[command(about = "Grab subtitles from opensubtitles.com for a media library")]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Root directory of media files
    pub directory: PathBuf,

    /// Subtitle language as 2-letter code, or several separated by commas,
    /// ordered by priority
    #[arg(value_parser = parse_language_list)]
    pub languages: LanguageList,

    /// Download every missing language instead of only the highest priority one found
    #[arg(long = "all-languages")]
    pub all_languages: bool,

    /// Accept subtitles split across several files
    #[arg(long = "multi-file")]
    pub multi_file: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from(["subsgrab", "/media", "en,ES"]).unwrap();
        assert_eq!(cli.directory, PathBuf::from("/media"));
        assert_eq!(cli.languages.0, vec!["en".to_string(), "es".to_string()]);
        assert!(!cli.all_languages);
        assert!(!cli.multi_file);
    }

    #[test]
    fn test_flags() {
        let cli =
            Cli::try_parse_from(["subsgrab", "/media", "fr", "--all-languages", "--multi-file"])
                .unwrap();
        assert!(cli.all_languages);
        assert!(cli.multi_file);
    }

    #[test]
    fn test_rejects_bad_languages() {
        assert!(Cli::try_parse_from(["subsgrab", "/media", "english"]).is_err());
        assert!(Cli::try_parse_from(["subsgrab", "/media", "en,en"]).is_err());
        assert!(Cli::try_parse_from(["subsgrab", "/media"]).is_err());
    }
}
