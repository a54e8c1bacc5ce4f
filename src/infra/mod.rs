pub mod nfo;
pub mod opensubtitles;
pub mod release_parser;
pub mod scanner;
