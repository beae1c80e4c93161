use std::collections::HashMap;

use crate::constant::*;
use crate::matcher::*;

/// Splits raw Cli tokens into recognized option occurrences and positional tokens.
pub(crate) struct TokenScanner {
    configs: Vec<OptionConfig>,
    spellings: HashMap<String, usize>,
}

impl TokenScanner {
    pub(crate) fn new(configs: Vec<OptionConfig>) -> Self {
        let mut spellings = HashMap::default();

        for (index, config) in configs.iter().enumerate() {
            for flag in config.flags() {
                // The first declaration of a spelling wins.
                spellings.entry(flag.clone()).or_insert(index);
            }
        }

        Self { configs, spellings }
    }

    pub(crate) fn scan(&self, tokens: &[&str]) -> Result<Scan, ScanError> {
        let mut scan = Scan::default();
        let mut index = 0;
        let mut only_positionals = false;

        while index < tokens.len() {
            let token = tokens[index];
            index += 1;

            if only_positionals {
                scan.positionals.push(token.to_string());
                continue;
            }

            if token == "--" {
                only_positionals = true;
                continue;
            }

            // Find an exact spelling, such as:
            //  --file
            //  -f
            //  file
            if let Some(&option) = self.spellings.get(token) {
                let value = self.take_value(option, token, tokens, &mut index)?;
                scan.occurrences.push(Occurrence { option, value });
                continue;
            }

            // Find a 'long' flag with an inline value, such as:
            //  --file=..
            if let Some(long) = token.strip_prefix("--") {
                if long == HELP_NAME {
                    scan.help = true;
                    return Ok(scan);
                }

                let (flag, value) = match long.split_once('=') {
                    Some((name, value)) => (format!("--{name}"), value),
                    None => return Err(ScanError::UnknownOption(token.to_string())),
                };

                match self.spellings.get(&flag) {
                    Some(&option) if self.configs[option].mode() == ValueMode::Flag => {
                        return Err(ScanError::UnexpectedValue(flag));
                    }
                    Some(&option) => scan.occurrences.push(Occurrence {
                        option,
                        value: Some(value.to_string()),
                    }),
                    None => return Err(ScanError::UnknownOption(flag)),
                }

                continue;
            }

            // Find clustered 'short' flag(s), such as (both -a and -f are example short flags):
            //  -aa
            //  -af..
            //  -af ..
            //  -af=..
            if looks_like_flag(token) {
                if self.feed_cluster(&token[1..], tokens, &mut index, &mut scan)? {
                    return Ok(scan);
                }

                continue;
            }

            scan.positionals.push(token.to_string());
        }

        Ok(scan)
    }

    // Returns whether help was requested.
    fn feed_cluster(
        &self,
        cluster: &str,
        tokens: &[&str],
        index: &mut usize,
        scan: &mut Scan,
    ) -> Result<bool, ScanError> {
        for (position, short) in cluster.char_indices() {
            let flag = format!("-{short}");

            match self.spellings.get(&flag) {
                Some(&option) => {
                    if self.configs[option].mode() == ValueMode::Flag {
                        scan.occurrences.push(Occurrence {
                            option,
                            value: None,
                        });
                        continue;
                    }

                    // A value taking flag consumes the rest of the cluster.
                    let remainder = &cluster[position + short.len_utf8()..];
                    let value = match remainder.strip_prefix('=') {
                        Some(inline) => Some(inline.to_string()),
                        None if remainder.is_empty() => self.take_value(option, &flag, tokens, index)?,
                        None => Some(remainder.to_string()),
                    };
                    scan.occurrences.push(Occurrence { option, value });
                    return Ok(false);
                }
                None if short == HELP_SHORT => {
                    scan.help = true;
                    return Ok(true);
                }
                None => return Err(ScanError::UnknownOption(flag)),
            }
        }

        Ok(false)
    }

    fn take_value(
        &self,
        option: usize,
        flag: &str,
        tokens: &[&str],
        index: &mut usize,
    ) -> Result<Option<String>, ScanError> {
        match self.configs[option].mode() {
            ValueMode::Flag => Ok(None),
            ValueMode::Required => match tokens.get(*index) {
                Some(next) => {
                    *index += 1;
                    Ok(Some(next.to_string()))
                }
                None => Err(ScanError::MissingValue(flag.to_string())),
            },
            ValueMode::Optional => match tokens.get(*index) {
                Some(next) if !self.spellings.contains_key(*next) && !looks_like_flag(next) => {
                    *index += 1;
                    Ok(Some(next.to_string()))
                }
                _ => Ok(None),
            },
        }
    }
}

fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !is_number(token)
}

fn is_number(token: &str) -> bool {
    let unsigned = token.strip_prefix('-').unwrap_or(token);
    unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') && token.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scanner() -> TokenScanner {
        TokenScanner::new(vec![
            OptionConfig::new(vec!["-a".to_string()], ValueMode::Flag),
            OptionConfig::new(
                vec!["-f".to_string(), "--file".to_string()],
                ValueMode::Optional,
            ),
            OptionConfig::new(vec!["--name".to_string()], ValueMode::Required),
            OptionConfig::new(vec!["init".to_string()], ValueMode::Flag),
        ])
    }

    fn occurrence(option: usize, value: Option<&str>) -> Occurrence {
        Occurrence {
            option,
            value: value.map(|v| v.to_string()),
        }
    }

    fn strings(values: Vec<&str>) -> Vec<String> {
        values.into_iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn scan_empty() {
        let scan = scanner().scan(empty::slice()).unwrap();
        assert_eq!(scan, Scan::default());
    }

    #[rstest]
    #[case(vec!["-a"], vec![occurrence(0, None)], vec![])]
    #[case(vec!["-a", "-a"], vec![occurrence(0, None), occurrence(0, None)], vec![])]
    #[case(vec!["-aaa"], vec![occurrence(0, None), occurrence(0, None), occurrence(0, None)], vec![])]
    #[case(vec!["-f", "x"], vec![occurrence(1, Some("x"))], vec![])]
    #[case(vec!["--file", "x"], vec![occurrence(1, Some("x"))], vec![])]
    #[case(vec!["--file=x"], vec![occurrence(1, Some("x"))], vec![])]
    #[case(vec!["--file=x=y"], vec![occurrence(1, Some("x=y"))], vec![])]
    #[case(vec!["-fx"], vec![occurrence(1, Some("x"))], vec![])]
    #[case(vec!["-f=x"], vec![occurrence(1, Some("x"))], vec![])]
    #[case(vec!["-f=", "x"], vec![occurrence(1, Some(""))], vec!["x"])]
    #[case(vec!["--file=", "x"], vec![occurrence(1, Some(""))], vec!["x"])]
    #[case(vec!["-afx"], vec![occurrence(0, None), occurrence(1, Some("x"))], vec![])]
    #[case(vec!["-af", "x"], vec![occurrence(0, None), occurrence(1, Some("x"))], vec![])]
    #[case(vec!["-f"], vec![occurrence(1, None)], vec![])]
    #[case(vec!["-f", "-a"], vec![occurrence(1, None), occurrence(0, None)], vec![])]
    #[case(vec!["-f", "init"], vec![occurrence(1, None), occurrence(3, None)], vec![])]
    #[case(vec!["-f", "-5"], vec![occurrence(1, Some("-5"))], vec![])]
    #[case(vec!["--name", "-a"], vec![occurrence(2, Some("-a"))], vec![])]
    #[case(vec!["init"], vec![occurrence(3, None)], vec![])]
    #[case(vec!["x", "-a", "y"], vec![occurrence(0, None)], vec!["x", "y"])]
    #[case(vec!["-5", "-1.5", "-"], vec![], vec!["-5", "-1.5", "-"])]
    #[case(vec!["--", "-a", "--file"], vec![], vec!["-a", "--file"])]
    #[case(vec!["-a", "--", "--"], vec![occurrence(0, None)], vec!["--"])]
    fn scan_tokens(
        #[case] tokens: Vec<&str>,
        #[case] occurrences: Vec<Occurrence>,
        #[case] positionals: Vec<&str>,
    ) {
        let scan = scanner().scan(tokens.as_slice()).unwrap();
        assert_eq!(scan.occurrences, occurrences);
        assert_eq!(scan.positionals, strings(positionals));
        assert!(!scan.help);
    }

    #[rstest]
    #[case(vec!["-b"], ScanError::UnknownOption("-b".to_string()))]
    #[case(vec!["-ab"], ScanError::UnknownOption("-b".to_string()))]
    #[case(vec!["--bad"], ScanError::UnknownOption("--bad".to_string()))]
    #[case(vec!["--bad=1"], ScanError::UnknownOption("--bad".to_string()))]
    #[case(vec!["--name"], ScanError::MissingValue("--name".to_string()))]
    #[case(vec!["-a", "--name"], ScanError::MissingValue("--name".to_string()))]
    #[case(vec!["--init=1"], ScanError::UnknownOption("--init".to_string()))]
    fn scan_error(#[case] tokens: Vec<&str>, #[case] expected: ScanError) {
        assert_eq!(scanner().scan(tokens.as_slice()).unwrap_err(), expected);
    }

    #[test]
    fn scan_flag_inline_value() {
        let scanner = TokenScanner::new(vec![OptionConfig::new(
            vec!["--verbose".to_string()],
            ValueMode::Flag,
        )]);
        assert_eq!(
            scanner.scan(&["--verbose=1"]).unwrap_err(),
            ScanError::UnexpectedValue("--verbose".to_string())
        );
    }

    #[rstest]
    #[case(vec!["-h"])]
    #[case(vec!["--help"])]
    #[case(vec!["-ah"])]
    #[case(vec!["x", "--help", "--bad"])]
    fn scan_help(#[case] tokens: Vec<&str>) {
        let scan = scanner().scan(tokens.as_slice()).unwrap();
        assert!(scan.help);
    }

    #[test]
    fn scan_declared_help_spelling() {
        let scanner = TokenScanner::new(vec![OptionConfig::new(
            vec!["-h".to_string(), "--host".to_string()],
            ValueMode::Required,
        )]);
        let scan = scanner.scan(&["-h", "localhost"]).unwrap();
        assert!(!scan.help);
        assert_eq!(scan.occurrences, vec![occurrence(0, Some("localhost"))]);
    }

    #[test]
    fn scan_duplicate_spelling() {
        let scanner = TokenScanner::new(vec![
            OptionConfig::new(vec!["-a".to_string()], ValueMode::Flag),
            OptionConfig::new(vec!["-a".to_string()], ValueMode::Required),
        ]);
        let scan = scanner.scan(&["-a", "x"]).unwrap();
        assert_eq!(scan.occurrences, vec![occurrence(0, None)]);
        assert_eq!(scan.positionals, strings(vec!["x"]));
    }

    #[rstest]
    #[case("-5", true)]
    #[case("-1.5", true)]
    #[case("-.5", true)]
    #[case("12", true)]
    #[case("-inf", false)]
    #[case("-a", false)]
    #[case("-", false)]
    fn number_detection(#[case] token: &str, #[case] expected: bool) {
        assert_eq!(is_number(token), expected);
    }
}
