//! Entity identifier derivation
//!
//! Connections and session adapters get random (v4) ids. Exchanges and
//! consumers get name-based (v5) ids derived from observable facts, so the
//! same entity always resolves to the same id: the default exchange keeps
//! its identity across broker restarts without being persisted, and a
//! consumer's id is reproducible from (vhost, queue, remote address,
//! channel, consumer name) across adapter rebuilds.

use uuid::Uuid;

/// Namespace for all name-based ids minted by this broker.
///
/// Fixed forever: changing it would change every derived id.
const BROKER_NAMESPACE: Uuid = Uuid::from_bytes([
    0x54, 0x1f, 0x0c, 0x9e, 0x6c, 0x3b, 0x4a, 0x21, //
    0x8f, 0x5d, 0x2a, 0x41, 0xd3, 0x98, 0x7b, 0x66,
]);

/// Generate a fresh random id (process-assigned identity)
pub fn random_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Deterministic id for an exchange, unique per (exchange name, vhost name)
pub fn exchange_uuid(exchange_name: &str, vhost_name: &str) -> Uuid {
    named_uuid(&[exchange_name, vhost_name])
}

/// Deterministic id for a consumer
///
/// Derived from everything that pins down a consumer on the wire, so the
/// id is stable for the same underlying consumer and distinct for any
/// other.
pub fn consumer_uuid(
    vhost_name: &str,
    queue_name: &str,
    remote_address: &str,
    channel_id: u32,
    consumer_name: &str,
) -> Uuid {
    let channel = channel_id.to_string();
    named_uuid(&[vhost_name, queue_name, remote_address, &channel, consumer_name])
}

fn named_uuid(parts: &[&str]) -> Uuid {
    // Length-prefix each part so ("ab","c") can never collide with ("a","bc").
    let mut material = Vec::new();
    for part in parts {
        material.extend_from_slice(&(part.len() as u32).to_be_bytes());
        material.extend_from_slice(part.as_bytes());
    }
    Uuid::new_v5(&BROKER_NAMESPACE, &material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_uuid_deterministic() {
        let a = exchange_uuid("amq.direct", "default");
        let b = exchange_uuid("amq.direct", "default");
        assert_eq!(a, b);
    }

    #[test]
    fn test_exchange_uuid_scoped_by_vhost() {
        let a = exchange_uuid("amq.direct", "default");
        let b = exchange_uuid("amq.direct", "other");
        assert_ne!(a, b);
    }

    #[test]
    fn test_consumer_uuid_deterministic() {
        let a = consumer_uuid("vh", "orders", "10.0.0.1:51234", 1, "ctag-1");
        let b = consumer_uuid("vh", "orders", "10.0.0.1:51234", 1, "ctag-1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_consumer_uuid_sensitive_to_each_input() {
        let base = consumer_uuid("vh", "orders", "10.0.0.1:51234", 1, "ctag-1");
        assert_ne!(base, consumer_uuid("vh2", "orders", "10.0.0.1:51234", 1, "ctag-1"));
        assert_ne!(base, consumer_uuid("vh", "invoices", "10.0.0.1:51234", 1, "ctag-1"));
        assert_ne!(base, consumer_uuid("vh", "orders", "10.0.0.2:51234", 1, "ctag-1"));
        assert_ne!(base, consumer_uuid("vh", "orders", "10.0.0.1:51234", 2, "ctag-1"));
        assert_ne!(base, consumer_uuid("vh", "orders", "10.0.0.1:51234", 1, "ctag-2"));
    }

    #[test]
    fn test_adjacent_parts_do_not_collide() {
        // ("ab", "c") vs ("a", "bc") with the rest held equal
        let a = consumer_uuid("ab", "c", "r", 1, "n");
        let b = consumer_uuid("a", "bc", "r", 1, "n");
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_uuid_unique() {
        assert_ne!(random_uuid(), random_uuid());
    }
}
