//! Parser-wide configuration (spec §3). An explicit struct threaded
//! through the engine rather than global state, per spec §9's redesign
//! hint — no hidden process-wide switches.

/// The recognized parser options from spec §3's configuration table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfiguration {
    pub case_sensitive_options: bool,
    pub convert_underscores: bool,
    pub allow_abbreviated_options: bool,
    pub minimum_abbreviation_length: usize,
    pub allow_abbreviated_subcommands: bool,
    pub strict_options_before_positionals: bool,
    pub allow_negative_numbers: bool,
    pub argfile_prefix: char,
    pub flatten_accumulated_values: bool,
}

impl Default for ParserConfiguration {
    fn default() -> Self {
        ParserConfiguration {
            case_sensitive_options: true,
            convert_underscores: false,
            allow_abbreviated_options: false,
            minimum_abbreviation_length: 3,
            allow_abbreviated_subcommands: false,
            strict_options_before_positionals: false,
            allow_negative_numbers: false,
            argfile_prefix: '@',
            flatten_accumulated_values: false,
        }
    }
}
