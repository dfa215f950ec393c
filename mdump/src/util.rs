pub fn format_size(bytes: u64) -> String {
    use humansize::{format_size, BINARY};
    format_size(bytes, BINARY)
}

pub fn format_size_hint(bytes: Option<u64>) -> String {
    bytes.map(format_size).unwrap_or_else(|| "-".into())
}

pub fn format_checksum(checksum: u64) -> String {
    format!("{:016x}", checksum)
}
