use ironclad_common::ChunkCoord;
use ironclad_world::{ChunkLayout, ChunkStore, NoiseField, TerrainParams, TerrainSynthesizer};
use proptest::prelude::*;

fn tiny_store(seed: u64) -> ChunkStore {
    let layout = ChunkLayout::new(4, 1).expect("valid layout");
    let terrain = TerrainSynthesizer::new(seed, TerrainParams::default()).expect("valid params");
    ChunkStore::new(layout, terrain)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn resident_set_equals_chebyshev_window(
        cx in -50i32..50,
        cy in -50i32..50,
        radius in 0u32..4,
        prior in proptest::collection::vec((-50i32..50, -50i32..50), 0..4),
    ) {
        let mut store = tiny_store(7);
        for (px, py) in prior {
            store.set_visible_window(ChunkCoord::new(px, py), 1);
            store.bake_window();
        }

        let center = ChunkCoord::new(cx, cy);
        store.set_visible_window(center, radius);
        store.bake_window();

        let resident = store.resident_coords();
        let side = 2 * radius as usize + 1;
        prop_assert_eq!(resident.len(), side * side);
        for coord in resident {
            prop_assert!(center.chebyshev_distance(coord) <= radius);
        }
    }

    #[test]
    fn noise_is_bounded_and_repeatable(seed in any::<u64>(), x in -1.0e4f64..1.0e4, y in -1.0e4f64..1.0e4) {
        let a = NoiseField::new(seed);
        let b = NoiseField::new(seed);
        let v = a.eval(x, y);
        prop_assert!((-1.0..=1.0).contains(&v));
        prop_assert_eq!(v.to_bits(), b.eval(x, y).to_bits());
    }

    #[test]
    fn fractal_is_bounded(seed in any::<u64>(), gx in -100_000i64..100_000, gy in -100_000i64..100_000) {
        let terrain = TerrainSynthesizer::new(seed, TerrainParams::default()).expect("valid params");
        let v = terrain.sample_cell(gx, gy);
        prop_assert!((-1.0..=1.0).contains(&v));
    }
}
