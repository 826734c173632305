//! Best-effort recovery of a JSON value from raw model text.
//!
//! Providers asked for pure JSON still wrap it in prose or markdown
//! fences now and then. Both routines here strip the fences, decide
//! between array and object by whichever opening bracket comes first,
//! and cut the value out of the surrounding text. Neither guarantees
//! valid JSON; the caller's parse step decides.

use log::trace;

use crate::config::RecoveryStrategy;

/// Remove ```` ```json ```` (any case) and ```` ``` ```` markers
pub fn strip_fences(text: &str) -> String
{   let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("```")
    {   out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        if rest.len() >= 4
          && rest.as_bytes()[..4].eq_ignore_ascii_case(b"json")
        {   rest = &rest[4..];
        }
    }
    out.push_str(rest);
    out
}

/// A `[` before any `{` (or with no `{` at all) means array
fn delimiters(cleaned: &str) -> (char, char)
{   match (cleaned.find('['), cleaned.find('{'))
    {   (Some(_), None) => ('[', ']')
      , (Some(array), Some(object)) if array < object => ('[', ']')
      , _ => ('{', '}')
    }
}

/// First opening bracket to the *last* matching closing bracket.
/// Over-captures when unrelated brackets trail the payload.
pub fn recover_json(text: &str) -> String
{   outermost(strip_fences(text))
}

fn outermost(cleaned: String) -> String
{   let (open, close) = delimiters(&cleaned);
    match (cleaned.find(open), cleaned.rfind(close))
    {   (Some(start), Some(end)) if start < end => {
          cleaned[start..=end].to_string()
        }
      , _ => {
          trace!("No {}..{} pair, keeping cleaned text", open, close);
          cleaned
        }
    }
}

/// First complete top-level value, tracking nesting depth and
/// string/escape state. Falls back to [`recover_json`] when the
/// value never closes (truncated output).
pub fn scan_json(text: &str) -> String
{   let cleaned = strip_fences(text);
    let (open, _) = delimiters(&cleaned);
    let start = match cleaned.find(open)
    {   Some(start) => start
      , None => return cleaned
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in cleaned[start..].char_indices()
    {   if in_string
        {   if escaped
            {   escaped = false;
            } else if c == '\\'
            {   escaped = true;
            } else if c == '"'
            {   in_string = false;
            }
            continue;
        }
        match c
        {   '"' => in_string = true
          , '{' | '[' => depth += 1
          , '}' | ']' => {
              depth = depth.saturating_sub(1);
              if depth == 0
              {   let end = start + offset;
                  return cleaned[start..=end].to_string();
              }
            }
          , _ => {}
        }
    }

    trace!("Value starting at {} never closes", start);
    outermost(cleaned)
}

/// Dispatch on the configured strategy
pub fn recover(text: &str, strategy: RecoveryStrategy) -> String
{   match strategy
    {   RecoveryStrategy::Outermost => recover_json(text)
      , RecoveryStrategy::Balanced => scan_json(text)
    }
}
