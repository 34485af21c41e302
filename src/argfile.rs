//! `@file` argument expansion (spec §4.3, §6). Runs once, over the whole
//! raw argv, before classification begins — by the time the engine's scan
//! loop sees a token stream, argument files have already been inlined.

use crate::config::ParserConfiguration;
use crate::error::Error;
use std::fs;
use std::path::Path;

const DEFAULT_MAX_DEPTH: usize = 8;

pub(crate) fn expand(tokens: &[String], config: &ParserConfiguration) -> Result<Vec<String>, Error> {
    expand_at_depth(tokens, config.argfile_prefix, 0)
}

fn expand_at_depth(tokens: &[String], prefix: char, depth: usize) -> Result<Vec<String>, Error> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut terminated = false;

    for (position, token) in tokens.iter().enumerate() {
        if terminated {
            out.push(token.clone());
            continue;
        }
        if token == "--" {
            terminated = true;
            out.push(token.clone());
            continue;
        }

        let mut chars = token.chars();
        match chars.next() {
            Some(c) if c == prefix => {
                let rest = chars.as_str();
                if rest.starts_with(prefix) {
                    // `@@foo` escapes to the literal token `@foo`.
                    out.push(format!("{prefix}{rest}"));
                    continue;
                }

                if depth >= DEFAULT_MAX_DEPTH {
                    return Err(Error::ArgFileCycle {
                        token: token.clone(),
                        position,
                    });
                }

                let expanded = read_argfile(rest, token, position)?;
                log::debug!("expanded argument file '{rest}' into {} token(s)", expanded.len());
                let nested = expand_at_depth(&expanded, prefix, depth + 1)?;
                out.extend(nested);
            }
            _ => out.push(token.clone()),
        }
    }

    Ok(out)
}

fn read_argfile(path: &str, token: &str, position: usize) -> Result<Vec<String>, Error> {
    let resolved = Path::new(path);
    let contents = fs::read_to_string(resolved).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ArgFileNotFound {
                token: token.to_string(),
                position,
            }
        } else {
            Error::ArgFileReadError {
                token: token.to_string(),
                position,
                message: e.to_string(),
            }
        }
    })?;

    Ok(contents
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|line| line.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cfg() -> ParserConfiguration {
        ParserConfiguration::default()
    }

    #[test]
    fn passes_plain_tokens_through() {
        let tokens = vec!["--verbose".to_string(), "file.txt".to_string()];
        let out = expand(&tokens, &cfg()).unwrap();
        assert_eq!(out, tokens);
    }

    #[test]
    fn stops_expanding_after_double_dash() {
        let tokens = vec!["--".to_string(), "@not-a-file".to_string()];
        let out = expand(&tokens, &cfg()).unwrap();
        assert_eq!(out, tokens);
    }

    #[test]
    fn unescapes_doubled_prefix() {
        let tokens = vec!["@@literal".to_string()];
        let out = expand(&tokens, &cfg()).unwrap();
        assert_eq!(out, vec!["@literal".to_string()]);
    }

    #[test]
    fn missing_file_is_reported() {
        let tokens = vec!["@/nonexistent/path/definitely".to_string()];
        let err = expand(&tokens, &cfg()).unwrap_err();
        assert!(matches!(err, Error::ArgFileNotFound { position: 0, .. }));
    }

    #[test]
    fn expands_file_contents_one_token_per_line() {
        let dir = std::env::temp_dir().join(format!("flagrant-argfile-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("args.txt");
        fs::write(&file, "--verbose\n# a comment\n\nsrc/main.rs\n").unwrap();

        let tokens = vec![format!("@{}", file.to_string_lossy())];
        let out = expand(&tokens, &cfg()).unwrap();
        assert_eq!(out, vec!["--verbose".to_string(), "src/main.rs".to_string()]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
