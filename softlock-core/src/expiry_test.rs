#[cfg(test)]
mod tests {
    use crate::expiry::ExpiryPolicy;
    use crate::test_support::{alice, minutes, NOW};
    use crate::types::{Lease, ResourceRef};

    fn lease(created_at: u64, updated_at: Option<u64>) -> Lease {
        Lease {
            id: 1,
            holder: alice(),
            resource: ResourceRef::new("4", "4"),
            created_at,
            updated_at,
        }
    }

    #[test]
    fn created_exactly_at_threshold_is_expired() {
        let l = lease(NOW - minutes(5), None);
        assert!(ExpiryPolicy::is_expired(&l, NOW, 5));
        assert!(!ExpiryPolicy::is_live(&l, NOW, 5));
    }

    #[test]
    fn created_one_minute_inside_window_is_live() {
        let l = lease(NOW - minutes(4), None);
        assert!(ExpiryPolicy::is_live(&l, NOW, 5));
    }

    #[test]
    fn one_millisecond_past_threshold_is_live() {
        let l = lease(NOW - minutes(5) + 1, None);
        assert!(ExpiryPolicy::is_live(&l, NOW, 5));
    }

    #[test]
    fn renewal_keeps_old_lease_alive() {
        // created long ago, renewed recently
        let l = lease(NOW - minutes(40), Some(NOW - minutes(1)));
        assert!(ExpiryPolicy::is_live(&l, NOW, 5));
    }

    #[test]
    fn stale_renewal_expires_even_with_recent_creation_ignored() {
        let l = lease(NOW - minutes(40), Some(NOW - minutes(5)));
        assert!(ExpiryPolicy::is_expired(&l, NOW, 5));

        let l = lease(NOW - minutes(40), Some(NOW - minutes(30)));
        assert!(ExpiryPolicy::is_expired(&l, NOW, 5));
    }

    #[test]
    fn duration_is_a_parameter() {
        let l = lease(NOW - minutes(6), None);
        assert!(ExpiryPolicy::is_expired(&l, NOW, 5));
        assert!(ExpiryPolicy::is_live(&l, NOW, 10));
    }

    #[test]
    fn threshold_saturates_near_epoch() {
        assert_eq!(ExpiryPolicy::threshold(1_000, 5), 0);
    }

    #[test]
    fn expires_at_uses_latest_timestamp() {
        let l = lease(NOW - minutes(40), Some(NOW - minutes(1)));
        assert_eq!(ExpiryPolicy::expires_at(&l, 5), NOW + minutes(4));
    }
}
