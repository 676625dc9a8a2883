use std::io::Read;
use std::path::Path;

use gitbridge::webhook::{sign_payload, verify_signature};

/// Read the payload from `path`, or stdin when it is `-`.
fn read_payload(path: &Path) -> std::io::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut payload = Vec::new();
        std::io::stdin().read_to_end(&mut payload)?;
        Ok(payload)
    } else {
        std::fs::read(path)
    }
}

/// Verify `signature` over the payload, or print the signature the payload
/// should carry when none is given.
pub(crate) fn handle_verify_webhook(
    payload: &Path,
    signature: Option<&str>,
    secret: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if secret.is_empty() {
        return Err("webhook secret must not be empty".into());
    }
    let body = read_payload(payload)?;

    let Some(signature) = signature else {
        println!("{}", sign_payload(&body, secret));
        return Ok(());
    };

    if verify_signature(&body, signature, secret) {
        println!("valid");
        Ok(())
    } else {
        Err(format!("signature does not match payload ({} bytes)", body.len()).into())
    }
}
