use crate::http_req::Params;
use base64::Engine;
use std::{borrow, error, fmt};
use url::form_urlencoded;

#[derive(Debug, PartialEq)]
pub enum CredentialsParsingError {
    NotBasic,
    InvalidBase64,
    InvalidUtf8,
    MissingColon,
}

impl fmt::Display for CredentialsParsingError {
    #[cfg_attr(coverage, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBasic => write!(f, "not a Basic authorization"),
            Self::InvalidBase64 => write!(f, "credentials are not valid base64"),
            Self::InvalidUtf8 => write!(f, "credentials are not valid UTF-8"),
            Self::MissingColon => write!(f, "credentials have no user:password separator"),
        }
    }
}

impl error::Error for CredentialsParsingError {}

/// Longest entity body between `&` and `;` that can decode (`#x10FFFF`, `#1114111`).
const MAX_ENTITY_LEN: usize = 8;

/// Decode the HTML entities of a query string (`&amp;`, `&#39;`, `&#x2F;`...).
///
/// Unknown or unterminated entities are kept as they are. The `;` is only looked for within reach of
/// the longest entity, so each `&` costs a bounded scan.
pub fn decode_html_entities(input: &str) -> borrow::Cow<'_, str> {
    if !input.contains('&') {
        return borrow::Cow::Borrowed(input);
    }

    let mut decoded = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp_idx) = rest.find('&') {
        decoded.push_str(&rest[..amp_idx]);
        let tail = &rest[amp_idx..];
        let entity = tail
            .bytes()
            .take(MAX_ENTITY_LEN + 2)
            .position(|b| b == b';')
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match entity {
            Some((c, end)) => {
                decoded.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &tail[1..];
            }
        }
    }
    decoded.push_str(rest);

    borrow::Cow::Owned(decoded)
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            // surrogates are rejected by `from_u32`
            char::from_u32(code).filter(|c| *c != '\0')
        }
    }
}

/// Decode a query string into an ordered map. A repeated key keeps its first position and its last
/// value.
pub fn parse_query(query: &str) -> Params {
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Like [`parse_query`] for a query that may have been copied out of HTML: entities (`&amp;`...) are
/// decoded before the form encoding.
pub fn parse_html_query(query: &str) -> Params {
    parse_query(&decode_html_entities(query))
}

/// Encode a map as a query string, in map order, with the form encoding (space as `+`).
pub fn build_query(params: &Params) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Build a single-line cookie header value: `name=value` pairs joined by `; `.
pub fn build_cookie_header(cookies: &Params) -> String {
    cookies
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                form_urlencoded::byte_serialize(name.as_bytes()).collect::<String>(),
                form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>()
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse a cookie header value (`a=1; b=2`) into a map. Pairs without a name are skipped.
pub fn parse_cookie_header(header: &str) -> Params {
    header
        .split(';')
        .map(str::trim)
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (!name.is_empty()).then(|| (decode_cookie_part(name), decode_cookie_part(value)))
        })
        .collect()
}

fn decode_cookie_part(part: &str) -> String {
    let part = part.replace('+', " ");
    match urlencoding::decode(&part) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => part,
    }
}

/// Parse the value of an `Authorization` header holding Basic credentials.
pub fn parse_basic_credentials(value: &str) -> Result<(String, String), CredentialsParsingError> {
    let encoded = value
        .trim()
        .strip_prefix("Basic ")
        .ok_or(CredentialsParsingError::NotBasic)?;
    let decoded = base64::prelude::BASE64_STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|_e| CredentialsParsingError::InvalidBase64)?;
    let decoded = String::from_utf8(decoded).map_err(|_e| CredentialsParsingError::InvalidUtf8)?;
    match decoded.split_once(':') {
        Some((user, password)) => Ok((String::from(user), String::from(password))),
        None => Err(CredentialsParsingError::MissingColon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect()
    }

    #[test]
    fn decode_html_entities_test() {
        assert_eq!(decode_html_entities("a=1&b=2"), "a=1&b=2");
        assert_eq!(decode_html_entities("a=1&amp;b=2"), "a=1&b=2");
        assert_eq!(decode_html_entities("q=&lt;tag&gt;"), "q=<tag>");
        assert_eq!(decode_html_entities("q=it&#39;s&#x2F;"), "q=it's/");
        assert_eq!(decode_html_entities("q=&unknown;&"), "q=&unknown;&");
        assert_eq!(decode_html_entities("&#x10FFFF;&#1114111;"), "\u{10FFFF}\u{10FFFF}");
        assert_eq!(decode_html_entities("a&#0;b&#x0;"), "a&#0;b&#x0;");
        assert_eq!(decode_html_entities("&#xD800;&#55296;"), "&#xD800;&#55296;");
        // the terminator is too far away for any entity
        assert_eq!(decode_html_entities("&ampersand;"), "&ampersand;");
        assert_eq!(decode_html_entities("&#0000000065;"), "&#0000000065;");
        assert!(matches!(
            decode_html_entities("plain"),
            borrow::Cow::Borrowed("plain")
        ));
    }

    #[test]
    fn decode_html_entities_without_terminator_test() {
        let input = "a&".repeat(50_000);
        assert_eq!(decode_html_entities(&input), input);

        let input = format!("{};", "&x".repeat(50_000));
        assert_eq!(decode_html_entities(&input), input);
    }

    #[test]
    fn parse_query_keeps_entities_test() {
        assert_eq!(
            parse_query("q=1&amp;x=2&lt=3;"),
            params(&[("q", "1"), ("amp;x", "2"), ("lt", "3;")])
        );
    }

    #[test]
    fn parse_html_query_test() {
        let query = parse_html_query("arg1=one&amp;arg2=two+words&arg3=%C3%A9&flag");
        assert_eq!(
            query,
            params(&[
                ("arg1", "one"),
                ("arg2", "two words"),
                ("arg3", "é"),
                ("flag", "")
            ])
        );
        assert_eq!(query.get_index(1).map(|(k, _)| k.as_str()), Some("arg2"));

        // repeated key: first position, last value
        let query = parse_html_query("a=1&b=2&a=3");
        assert_eq!(query.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(query["a"], "3");

        assert!(parse_query("").is_empty());
    }

    #[test]
    fn build_query_test() {
        assert_eq!(build_query(&Params::new()), "");
        assert_eq!(
            build_query(&params(&[("arg1", "edno"), ("arg2", "two"), ("foo", "bar")])),
            "arg1=edno&arg2=two&foo=bar"
        );
        assert_eq!(
            build_query(&params(&[("q", "a b&c=d")])),
            "q=a+b%26c%3Dd"
        );
    }

    #[test]
    fn cookie_header_test() {
        let cookies = params(&[("cookiename", "cookievalue"), ("foo", "bar baz")]);
        let header = build_cookie_header(&cookies);
        assert_eq!(header, "cookiename=cookievalue; foo=bar+baz");
        assert_eq!(parse_cookie_header(&header), cookies);

        assert_eq!(
            parse_cookie_header(" a=1;;=x; b ; c=%3D"),
            params(&[("a", "1"), ("b", ""), ("c", "=")])
        );
    }

    #[test]
    fn parse_basic_credentials_test() {
        // "user:pa:ss"
        assert_eq!(
            parse_basic_credentials("Basic dXNlcjpwYTpzcw=="),
            Ok((String::from("user"), String::from("pa:ss")))
        );
        assert_eq!(
            parse_basic_credentials("Bearer abc"),
            Err(CredentialsParsingError::NotBasic)
        );
        assert_eq!(
            parse_basic_credentials("Basic !!!"),
            Err(CredentialsParsingError::InvalidBase64)
        );
        // "nocolon"
        assert_eq!(
            parse_basic_credentials("Basic bm9jb2xvbg=="),
            Err(CredentialsParsingError::MissingColon)
        );
    }
}
