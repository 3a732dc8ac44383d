use ironclad_common::{CellKey, PixelRect};
use proptest::prelude::*;

fn arb_rect() -> impl Strategy<Value = PixelRect> {
    (-2_000i32..2_000, -2_000i32..2_000, 0i32..200, 0i32..200)
        .prop_map(|(x, y, w, h)| PixelRect::new(x, y, w, h))
}

proptest! {
    #[test]
    fn intersects_is_symmetric(a in arb_rect(), b in arb_rect()) {
        prop_assert_eq!(a.intersects(&b), b.intersects(&a));
    }

    #[test]
    fn every_pixel_lies_in_cell_span(r in arb_rect(), cell in 1i32..96) {
        prop_assume!(!r.is_empty());
        let (min, max) = r.cell_span(cell).expect("non-empty");
        for (px, py) in [(r.x, r.y), (r.right() - 1, r.bottom() - 1), (r.x, r.bottom() - 1)] {
            let key = CellKey::containing(px, py, cell);
            prop_assert!(key.x >= min.x && key.x <= max.x);
            prop_assert!(key.y >= min.y && key.y <= max.y);
        }
    }

    #[test]
    fn four_quarter_turns_restore_rect(x in 0i32..16, y in 0i32..16, w in 1i32..16, h in 1i32..16) {
        let r = PixelRect::new(x, y, w, h);
        let mut turned = r;
        for _ in 0..4 {
            turned = turned.rotated_in_canvas(32, 32, 1);
        }
        prop_assert_eq!(turned, r);
    }
}
