//! Deterministic `IEAgAgRule` naming. The name is a pure function of
//! `(direction, local AG, target AG, transport)`, so regenerating a rule
//! from the same inputs always yields the same name and the reactive
//! engine's diff can match "the same rule" across runs by name alone.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::model::{Direction, Identifier, Transport};

/// `<3-letter direction>-xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, the hex part
/// being the first 16 bytes of `sha256("<dir>-<localAG>-<targetAG>-<transport>")`
/// laid out as a UUID purely for its familiar, fixed-width grouping — it is
/// not a real (random or time-based) UUID and claims no uniqueness property
/// beyond the hash's.
pub fn rule_name(
    direction: Direction,
    local_ag: &Identifier,
    target_ag: &Identifier,
    transport: Transport,
) -> String {
    let input = format!(
        "{}-{}-{}-{}",
        direction.as_lower(),
        local_ag.name,
        target_ag.name,
        transport.as_lower()
    );
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    let uuid = Uuid::from_bytes(bytes);
    format!("{}-{}", direction.prefix3(), uuid)
}
