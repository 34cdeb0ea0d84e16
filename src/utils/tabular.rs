/// Renders a header line plus one comma separated line per row.
///
/// Values are written as-is: none of the exported columns can contain a
/// comma or a newline except `notes`, which is quoted when it does.
pub fn render_csv<I>(headers: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = headers.join(",");
    out.push('\n');
    for row in rows {
        let line = row.iter().map(|v| escape(v)).collect::<Vec<_>>().join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}
