/// Advances a version identifier.
///
/// A run of trailing ASCII digits is incremented as a decimal number (growing
/// in width when it overflows, `9` becomes `10`). An identifier without
/// trailing digits gets `1` appended, so the empty string becomes `"1"`.
pub fn increment_version(version: &str) -> String {
    let digits_start = version
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx);

    let Some(start) = digits_start else {
        return format!("{version}1");
    };

    let (prefix, digits) = version.split_at(start);
    let mut bytes = digits.as_bytes().to_vec();
    let mut carry = true;
    for byte in bytes.iter_mut().rev() {
        if !carry {
            break;
        }
        if *byte == b'9' {
            *byte = b'0';
        } else {
            *byte += 1;
            carry = false;
        }
    }

    let mut incremented = String::with_capacity(version.len() + 1);
    incremented.push_str(prefix);
    if carry {
        incremented.push('1');
    }
    // Only ASCII digits were touched.
    incremented.extend(bytes.iter().map(|b| char::from(*b)));
    incremented
}
