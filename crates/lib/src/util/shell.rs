//! POSIX shell quoting and splitting.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
  #[error("unterminated {0} quote in command line")]
  UnterminatedQuote(char),

  #[error("command line ends with an escape character")]
  TrailingEscape,
}

/// Quote `arg` for a POSIX shell.
///
/// Arguments made only of `[A-Za-z0-9_@%+=:,./-]` are returned unchanged; anything
/// else is wrapped in single quotes with embedded single quotes spliced as `'"'"'`.
pub fn quote(arg: &str) -> String {
  if arg.is_empty() {
    return "''".to_string();
  }
  if arg.chars().all(is_safe) {
    return arg.to_string();
  }
  format!("'{}'", arg.replace('\'', "'\"'\"'"))
}

fn is_safe(c: char) -> bool {
  c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

/// Join command tokens into a single shell-escaped command line.
///
/// Single quotes are stripped from each token before quoting, so a token that was
/// itself pre-quoted (`"'local queue'"`) comes out as one argument (`'local queue'`).
pub fn join<S: AsRef<str>>(tokens: &[S]) -> String {
  tokens
    .iter()
    .map(|t| quote(&t.as_ref().replace('\'', "")))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Split a command line into tokens the way a POSIX shell would.
///
/// Inside single quotes everything is literal. Inside double quotes a backslash
/// only escapes `$`, `` ` ``, `"`, a backslash or a newline. An unquoted backslash
/// escapes the next character. No expansion is performed.
pub fn split(line: &str) -> Result<Vec<String>, SplitError> {
  let mut tokens = Vec::new();
  let mut current: Option<String> = None;
  let mut chars = line.chars();

  while let Some(c) = chars.next() {
    match c {
      c if c.is_whitespace() => {
        if let Some(token) = current.take() {
          tokens.push(token);
        }
      }
      '\'' => {
        let token = current.get_or_insert_with(String::new);
        loop {
          match chars.next() {
            Some('\'') => break,
            Some(c) => token.push(c),
            None => return Err(SplitError::UnterminatedQuote('\'')),
          }
        }
      }
      '"' => {
        let token = current.get_or_insert_with(String::new);
        loop {
          match chars.next() {
            Some('"') => break,
            Some('\\') => match chars.next() {
              Some('\n') => {}
              Some(c @ ('$' | '`' | '"' | '\\')) => token.push(c),
              Some(c) => {
                token.push('\\');
                token.push(c);
              }
              None => return Err(SplitError::UnterminatedQuote('"')),
            },
            Some(c) => token.push(c),
            None => return Err(SplitError::UnterminatedQuote('"')),
          }
        }
      }
      '\\' => match chars.next() {
        Some('\n') => {}
        Some(c) => current.get_or_insert_with(String::new).push(c),
        None => return Err(SplitError::TrailingEscape),
      },
      c => current.get_or_insert_with(String::new).push(c),
    }
  }

  tokens.extend(current);
  Ok(tokens)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn safe_tokens_are_untouched() {
    assert_eq!(quote("train.py"), "train.py");
    assert_eq!(quote("--lr=0.01"), "--lr=0.01");
    assert_eq!(quote("numpy"), "numpy");
  }

  #[test]
  fn unsafe_tokens_are_single_quoted() {
    assert_eq!(quote("hello world"), "'hello world'");
    assert_eq!(quote("$HOME"), "'$HOME'");
    assert_eq!(quote("it's"), "'it'\"'\"'s'");
  }

  #[test]
  fn empty_token_is_empty_quotes() {
    assert_eq!(quote(""), "''");
  }

  #[test]
  fn join_strips_single_quotes() {
    assert_eq!(join(&["python", "train.py"]), "python train.py");
    assert_eq!(join(&["echo", "'local container queue'"]), "echo 'local container queue'");
  }

  mod splitting {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
      assert_eq!(split("  python   train.py\t--lr 0.1 ").unwrap(), ["python", "train.py", "--lr", "0.1"]);
    }

    #[test]
    fn quoted_words_stay_together() {
      assert_eq!(
        split("python train.py --msg 'hello world'").unwrap(),
        ["python", "train.py", "--msg", "hello world"]
      );
      assert_eq!(split(r#"echo "a \"b\" $x""#).unwrap(), ["echo", r#"a "b" $x"#]);
      assert_eq!(split("--name=\"my run\"").unwrap(), ["--name=my run"]);
    }

    #[test]
    fn escapes_and_empty_quotes() {
      assert_eq!(split(r"a\ b c").unwrap(), ["a b", "c"]);
      assert_eq!(split("run ''").unwrap(), ["run", ""]);
      assert_eq!(split(r#""C:\dir""#).unwrap(), [r"C:\dir"]);
    }

    #[test]
    fn rejects_unbalanced_input() {
      assert_eq!(split("echo 'oops"), Err(SplitError::UnterminatedQuote('\'')));
      assert_eq!(split("echo \"oops"), Err(SplitError::UnterminatedQuote('"')));
      assert_eq!(split("echo oops\\"), Err(SplitError::TrailingEscape));
    }

    #[test]
    fn split_then_join_keeps_argument_boundaries() {
      let tokens = split("python train.py --msg 'hello world'").unwrap();
      assert_eq!(join(&tokens), "python train.py --msg 'hello world'");
    }
  }
}
