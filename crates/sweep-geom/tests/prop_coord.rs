use num_bigint::{BigInt, Sign};
use proptest::prelude::*;
use sweep_geom::{Coordinate, PartitionKey, saturating_i64};

// Magnitudes well past 64 bits.
fn huge() -> impl Strategy<Value = BigInt> {
    (any::<bool>(), prop::collection::vec(any::<u32>(), 0..6)).prop_map(|(neg, digits)| {
        let sign = if neg { Sign::Minus } else { Sign::Plus };
        BigInt::from_slice(sign, &digits)
    })
}

fn coord() -> impl Strategy<Value = Coordinate> {
    (huge(), huge()).prop_map(|(x, y)| Coordinate { x, y })
}

proptest! {
    #[test]
    fn sub_undoes_add(a in coord(), b in coord()) {
        let sum = &a + &b;
        prop_assert_eq!(&sum - &b, a);
    }

    #[test]
    fn mod_floor_stays_in_cell(c in coord(), m in 1i64..4096) {
        let r = c.mod_floor(m);
        let (rx, ry) = r.saturating_i64();
        prop_assert!((0..m).contains(&rx));
        prop_assert!((0..m).contains(&ry));
        // c == div_floor * m + mod_floor
        let back = &(&c.div_floor(m) * m) + &r;
        prop_assert_eq!(back, c);
    }

    #[test]
    fn abs_delta_of_nearby_points_is_exact(c in coord(), dx in -1_000_000i64..1_000_000, dy in -1_000_000i64..1_000_000) {
        let moved = c.offset(dx, dy);
        prop_assert_eq!(moved.abs_delta(&c), (dx.abs(), dy.abs()));
    }

    #[test]
    fn decimal_encoding_is_lossless(c in coord()) {
        let (x, y) = c.to_decimal();
        prop_assert_eq!(Coordinate::from_decimal(&x, &y).unwrap(), c);
    }

    #[test]
    fn tile_at_matches_manual_formula(k in coord(), n in 1usize..64, lx in 0i64..64, ly in 0i64..64) {
        let key = PartitionKey(k.clone());
        let tile = key.tile_at(n, lx, ly);
        prop_assert_eq!(tile.x, &k.x * n as i64 + lx);
        prop_assert_eq!(tile.y, &k.y * n as i64 + ly);
    }
}

#[test]
fn keys_compare_by_value() {
    let a = PartitionKey::new(BigInt::from(7) << 100u32, -3);
    let b = PartitionKey::new(BigInt::from(7) << 100u32, -3);
    assert_eq!(a, b);
    assert_ne!(a, PartitionKey::new(7, -3));
}

#[test]
fn saturating_keeps_small_values() {
    assert_eq!(saturating_i64(&BigInt::from(-42)), -42);
}

#[test]
fn serializes_as_decimal_strings() {
    let c = Coordinate::new(BigInt::from(1) << 70u32, -1);
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, r#"{"x":"1180591620717411303424","y":"-1"}"#);
}
