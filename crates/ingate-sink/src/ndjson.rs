use ingate_core::{DeliveryError, Record};

/// Encode a batch as newline-delimited JSON, one record per line.
///
/// A record that cannot be serialized fails the whole batch as a permanent
/// error; partial output never reaches a destination.
pub(crate) fn encode(records: &[Record]) -> Result<Vec<u8>, DeliveryError> {
    let mut buf = Vec::with_capacity(records.len() * 64);
    for record in records {
        serde_json::to_writer(&mut buf, record).map_err(DeliveryError::permanent)?;
        buf.push(b'\n');
    }
    Ok(buf)
}
