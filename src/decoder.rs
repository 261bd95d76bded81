use crate::error::DecodeError;

/// Control directive ending the session: literal `QUIT` in the first four
/// bytes of the line, checked before any decoding.
pub fn is_quit(line: &str) -> bool {
    line.as_bytes().starts_with(b"QUIT")
}

/// Parse one input line into exactly `expected` base-10 setpoints.
///
/// Values are returned unclamped; range handling belongs to the dispatcher.
pub fn decode_goal_line(line: &str, expected: usize) -> Result<Vec<i32>, DecodeError> {
    let mut values = Vec::with_capacity(expected);
    for token in line.split_whitespace() {
        match token.parse::<i32>() {
            Ok(v) => values.push(v),
            Err(_) => {
                return Err(DecodeError {
                    expected,
                    found: values.len(),
                })
            }
        }
    }
    if values.len() != expected {
        return Err(DecodeError {
            expected,
            found: values.len(),
        });
    }
    Ok(values)
}
