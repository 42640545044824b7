//! Greedy line wrapping over an injected width measure.

/// Wrap a single line at the available width.
///
/// Words accumulate while the rendered width stays within `available`;
/// an overflowing word flushes the current line and starts the next one.
/// A word wider than the whole width still gets a line of its own.
pub fn wrap_line(line: &str, available: f64, measure: &dyn Fn(&str) -> f64) -> Vec<String> {
    if measure(line) <= available {
        return vec![line.to_string()];
    }

    let mut wrapped = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure(&candidate) <= available {
            current = candidate;
        } else {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        wrapped.push(current);
    }

    if wrapped.is_empty() {
        // Whitespace-only input measured wider than available.
        wrapped.push(line.to_string());
    }

    wrapped
}

/// Wrap multi-line text, preserving its existing line breaks.
pub fn wrap_text(text: &str, available: f64, measure: &dyn Fn(&str) -> f64) -> Vec<String> {
    text.lines()
        .flat_map(|line| wrap_line(line, available, measure))
        .collect()
}
