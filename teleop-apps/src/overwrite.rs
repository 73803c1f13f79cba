use toml::Value;
use toml_query::{delete::TomlValueDeleteExt, insert::TomlValueInsertExt, read::TomlValueReadExt};
use tracing::debug;

use crate::Error;

const SEPARATORS: &[char] = &['\n', ';'];

/// Applies `--config` scripts to a TOML document.
///
/// Scripts are separated by newlines or semicolons; empty scripts are
/// ignored.
///
/// - `<key> = <value>` sets the key, creating intermediate tables as needed.
/// - `<key> =` deletes the key. Deleting a missing key is not an error.
///
/// ```
/// let s = teleop_apps::overwrite_str(
///     "[limits]\nmax_linear = 0.5\n",
///     "limits.max_linear = 0.2; connection.url = \"ws://robot:9090\"",
/// )
/// .unwrap();
/// let doc: toml::Value = toml::from_str(&s).unwrap();
/// assert_eq!(doc["limits"]["max_linear"].as_float(), Some(0.2));
/// assert_eq!(doc["connection"]["url"].as_str(), Some("ws://robot:9090"));
/// ```
pub fn overwrite(doc: &mut Value, scripts: &str) -> Result<(), Error> {
    for script in split_scripts(scripts)? {
        let (query, value) = parse_script(&script)?;
        let err = |e: toml_query::error::Error| Error::Overwrite(script.clone(), e.to_string());
        match value {
            Some(value) => {
                debug!(?query, ?value, "executing insert operation");
                doc.insert(&query, value).map_err(err)?;
            }
            None => {
                let Some(old) = doc.read_mut(&query).map_err(err)? else {
                    debug!(?query, "nothing to delete");
                    continue;
                };
                // toml-query refuses to delete non-empty tables and arrays.
                if old.is_table() {
                    *old = Value::Table(toml::value::Map::new());
                } else if old.is_array() {
                    *old = Value::Array(vec![]);
                }
                debug!(?query, "executing delete operation");
                doc.delete(&query).map_err(err)?;
            }
        }
    }
    Ok(())
}

/// [`overwrite`] on a TOML string, returning the edited document.
pub fn overwrite_str(doc: &str, scripts: &str) -> Result<String, Error> {
    let mut doc: Value =
        toml::from_str(doc).map_err(|e| Error::Overwrite(scripts.to_owned(), e.to_string()))?;
    overwrite(&mut doc, scripts)?;
    toml::to_string(&doc).map_err(|e| Error::Overwrite(scripts.to_owned(), e.to_string()))
}

/// Splits on separators outside of string literals, arrays and inline tables.
fn split_scripts(s: &str) -> Result<Vec<String>, Error> {
    let mut scripts = vec![];
    let mut buf = String::new();
    let mut quote = None;
    let mut depth = 0i32;
    let mut escaped = false;
    for ch in s.chars() {
        if let Some(q) = quote {
            buf.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' && q == '"' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                buf.push(ch);
            }
            '[' | '{' => {
                depth += 1;
                buf.push(ch);
            }
            ']' | '}' => {
                depth -= 1;
                buf.push(ch);
            }
            _ if depth <= 0 && SEPARATORS.contains(&ch) => {
                if !buf.trim().is_empty() {
                    scripts.push(std::mem::take(&mut buf));
                }
                buf.clear();
            }
            _ => buf.push(ch),
        }
    }
    if let Some(q) = quote {
        return Err(Error::Overwrite(
            s.to_owned(),
            format!("unexpected eof, expected `{q}`"),
        ));
    }
    if !buf.trim().is_empty() {
        scripts.push(buf);
    }
    Ok(scripts)
}

/// Parses `<key> = <value>` into a toml-query path and the value to set.
fn parse_script(script: &str) -> Result<(String, Option<Value>), Error> {
    let Some((key, value)) = script.split_once('=') else {
        return Err(Error::Overwrite(script.to_owned(), "expected `=`".to_owned()));
    };
    let key = key.trim();
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(Error::Overwrite(script.to_owned(), format!("invalid key `{key}`")));
    }
    // `a[0].b` is spelled `a.[0].b` in toml-query
    let query = key.replace("].[", "][").replace('[', ".[").replace("..[", ".[");

    let value = value.trim();
    if value.is_empty() {
        return Ok((query, None));
    }
    let parsed: Value = toml::from_str(&format!("v = {value}"))
        .map_err(|e| Error::Overwrite(script.to_owned(), e.to_string()))?;
    let value = parsed
        .get("v")
        .cloned()
        .ok_or_else(|| Error::Overwrite(script.to_owned(), "missing value".to_owned()))?;
    Ok((query, Some(value)))
}
