//! The few ESC/POS commands the agent emits on its own.
//!
//! Job payloads are opaque and written verbatim; this module only covers
//! the optional finishing step configured on the agent side.

/// `GS V 1`: partial paper cut (one point left uncut).
pub const PARTIAL_CUT: [u8; 3] = [0x1D, 0x56, 0x01];

/// Returns `payload` followed by a partial cut command.
pub fn append_partial_cut(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + PARTIAL_CUT.len());
    out.extend_from_slice(payload);
    out.extend_from_slice(&PARTIAL_CUT);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_partial_cut_keeps_payload_prefix() {
        let out = append_partial_cut(&[0x1B, 0x40]);
        assert_eq!(out, vec![0x1B, 0x40, 0x1D, 0x56, 0x01]);
    }

    #[test]
    fn test_append_partial_cut_to_empty_payload() {
        assert_eq!(append_partial_cut(&[]), PARTIAL_CUT.to_vec());
    }
}
