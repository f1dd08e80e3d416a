// Page title extraction

/// Extract the text of the first `<title>` element
///
/// Tag matching is ASCII case-insensitive; entities are decoded and
/// whitespace runs collapse to one space. Returns `None` when the document
/// has no complete title element.
pub fn extract_title(html: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `html`
    let lower = html.to_ascii_lowercase();

    let mut search_from = 0;
    let content_start = loop {
        let open = search_from + lower[search_from..].find("<title")?;
        let after_name = open + "<title".len();
        match lower[after_name..].chars().next() {
            Some('>') => break after_name + 1,
            Some(c) if c.is_ascii_whitespace() => {
                break after_name + lower[after_name..].find('>')? + 1;
            }
            // e.g. <titlebar>
            _ => search_from = after_name,
        }
    };

    let content_end = content_start + lower[content_start..].find("</title")?;
    let raw = &html[content_start..content_end];

    Some(collapse_whitespace(&decode_entities(raw)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode named (`&amp;` `&lt;` `&gt;` `&quot;` `&apos;` `&nbsp;`) and
/// numeric (`&#39;` `&#x27;`) character references
///
/// Unknown or malformed references are kept verbatim.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
