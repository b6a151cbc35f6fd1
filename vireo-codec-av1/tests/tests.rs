use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use vireo_codec_av1::common::{BlockSize, Mv, PredictionMode, RefFrame, SuperblockSize, TxSize};
use vireo_codec_av1::grid::{BlockInfo, ModeInfoGrid, TileInfo};
use vireo_codec_av1::loopfilter::{
    ApplierOptions, EdgeDir, FilterEdge, LoopFilterApplier, LoopFilterFrame, LoopFilterInfo,
    LoopFilterParams, MaskBuilder, MaskOptions, SegmentationParams, TileLayout,
};
use vireo_codec_av1::mvref::{
    clamp_mv_ref, FrameMvContext, FrameRefs, MvRefOptions, MvRefTarget, REF_CAT_LEVEL,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn square(size_mi: usize) -> BlockSize {
    match size_mi {
        16 => BlockSize::B64x64,
        8 => BlockSize::B32x32,
        4 => BlockSize::B16x16,
        2 => BlockSize::B8x8,
        _ => BlockSize::B4x4,
    }
}

fn random_block(rng: &mut SmallRng, bsize: BlockSize) -> BlockInfo {
    const REFS: [RefFrame; 3] = [RefFrame::Last, RefFrame::Golden, RefFrame::BwdRef];

    let mut mv = || Mv::new(rng.random_range(-64..64), rng.random_range(-64..64));
    let (a, b) = (mv(), mv());

    let block = match rng.random_range(0..4) {
        0 => BlockInfo::intra(bsize, PredictionMode::DcPred),
        1 => BlockInfo::compound(
            bsize,
            PredictionMode::NearestNearestMv,
            [RefFrame::Last, RefFrame::BwdRef],
            [a, b],
        ),
        _ => {
            let rf = REFS[rng.random_range(0..REFS.len())];
            BlockInfo::inter(bsize, PredictionMode::NearestMv, rf, a)
        }
    };

    block.with_skip(rng.random_bool(0.3))
}

/// Covers the square area at `(mi_row, mi_col)` with blocks, splitting it at random.
fn partition(
    rng: &mut SmallRng,
    grid: &mut ModeInfoGrid,
    mi_row: usize,
    mi_col: usize,
    size: usize,
) {
    if mi_row >= grid.mi_rows() || mi_col >= grid.mi_cols() {
        return;
    }

    if size == 1 || rng.random_bool(0.35) {
        let block = random_block(rng, square(size));
        grid.insert(mi_row, mi_col, block).unwrap();
        return;
    }

    let half = size / 2;

    for (row, col) in [(0, 0), (0, half), (half, 0), (half, half)] {
        partition(rng, grid, mi_row + row, mi_col + col, half);
    }
}

fn random_grid(seed: u64, mi_rows: usize, mi_cols: usize) -> ModeInfoGrid {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut grid = ModeInfoGrid::new(mi_rows, mi_cols).unwrap();

    for row in (0..mi_rows).step_by(16) {
        for col in (0..mi_cols).step_by(16) {
            partition(&mut rng, &mut grid, row, col, 16);
        }
    }

    grid
}

#[test]
fn random_partitions_build_exclusive_masks() {
    init_logger();

    let params = LoopFilterParams {
        filter_level: [20, 12],
        filter_level_u: 8,
        filter_level_v: 6,
        ..Default::default()
    };
    let seg = SegmentationParams::default();
    let mut info = LoopFilterInfo::new(&params);
    info.frame_init(&params, &seg);
    let tiles = TileLayout::default();

    for seed in 0..24 {
        // Odd dimensions leave partial 64x64 areas on the right and bottom.
        let grid = random_grid(seed, 37, 45);

        let builder =
            MaskBuilder::new(&grid, &info, &params, &seg, &tiles, MaskOptions::default());

        for mi_row in (0..grid.mi_rows()).step_by(16) {
            for mi_col in (0..grid.mi_cols()).step_by(16) {
                let mask = builder.build_mask(mi_row, mi_col).unwrap();

                assert!(mask.check_exclusive().is_ok());

                for row in 0..mask.rows {
                    if mi_col == 0 {
                        assert!(mask.left_y.iter().all(|class| !class.get(row, 0)));
                    }
                    for col in mask.cols..16 {
                        assert!(mask.left_y.iter().all(|class| !class.get(row, col)));
                    }
                }

                if mi_row == 0 {
                    for col in 0..mask.cols {
                        assert!(mask.above_y.iter().all(|class| !class.get(0, col)));
                    }
                }
            }
        }
    }
}

#[test]
fn random_partitions_filter_inside_planes() {
    init_logger();

    let params = LoopFilterParams {
        filter_level: [32, 32],
        filter_level_u: 16,
        filter_level_v: 16,
        ..Default::default()
    };
    let seg = SegmentationParams::default();
    let mut info = LoopFilterInfo::new(&params);
    info.frame_init(&params, &seg);
    let tiles = TileLayout::default();

    let grid = random_grid(7, 32, 48);

    let builder =
        MaskBuilder::new(&grid, &info, &params, &seg, &tiles, MaskOptions::default());
    let applier = LoopFilterApplier::new(&info, ApplierOptions::default());
    let frame = LoopFilterFrame::new(builder, applier, SuperblockSize::Sb64);

    let (width, height) = (grid.mi_cols() * 4, grid.mi_rows() * 4);

    let mut edges = Vec::new();
    let mut record = |edge: &FilterEdge| edges.push(*edge);

    frame.filter_frame(&mut record).unwrap();

    assert!(!edges.is_empty());

    for edge in &edges {
        let subsampling = usize::from(edge.plane.index() != 0);
        let (w, h) = (width >> subsampling, height >> subsampling);

        assert!(edge.x < w && edge.y < h);

        match edge.dir {
            EdgeDir::Vertical => assert!(edge.x > 0 && edge.x % 4 == 0),
            EdgeDir::Horizontal => assert!(edge.y > 0 && edge.y % 4 == 0),
        }
    }
}

#[test]
fn adjacent_duplicates_merge_into_one_candidate() {
    init_logger();

    let mv = Mv::new(-20, 36);
    let block = || BlockInfo::inter(BlockSize::B8x8, PredictionMode::NearestMv, RefFrame::Last, mv);

    let mut grid = ModeInfoGrid::new(16, 16).unwrap();
    // Above, left, above-right and above-left of the 8x8 block at (4, 4).
    for (row, col) in [(2, 4), (4, 2), (2, 6), (2, 2)] {
        grid.insert(row, col, block()).unwrap();
    }

    let refs = FrameRefs::default();
    let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default());
    let found = ctx.find_mv_refs(4, 4, BlockSize::B8x8, MvRefTarget::Single(RefFrame::Last));

    assert_eq!(found.stack.len(), 1);
    assert_eq!(found.stack.nearest_count(), 1);

    // Four neighbours of weight 4, the first three adjacent.
    let first = found.stack.get(0).unwrap();
    assert_eq!(first.this_mv, mv);
    assert_eq!(first.weight, 16 + REF_CAT_LEVEL);

    // Nearest matches above and left, none coded with a new motion vector.
    assert_eq!(found.mode_context.newmv_ctx(), 5);
    assert_eq!(found.mode_context.refmv_ctx(), 5);

    assert_eq!(found.mv_ref_list, [mv, Mv::ZERO]);
}

#[test]
fn heavier_candidates_sort_first() {
    let above = Mv::new(4, 4);
    let left = Mv::new(-4, 8);

    let inter = |bsize, mv| BlockInfo::inter(bsize, PredictionMode::NearestMv, RefFrame::Last, mv);

    // Equal weights keep the scan order.
    let mut grid = ModeInfoGrid::new(16, 16).unwrap();
    grid.insert(2, 4, inter(BlockSize::B8x8, above)).unwrap();
    grid.insert(4, 2, inter(BlockSize::B8x8, left)).unwrap();

    let refs = FrameRefs::default();
    let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default());
    let found = ctx.find_mv_refs(4, 4, BlockSize::B8x8, MvRefTarget::Single(RefFrame::Last));

    let order: Vec<Mv> = found.stack.iter().map(|c| c.this_mv).collect();
    assert_eq!(order, [above, left]);

    // A wider left neighbour weighs more.
    let mut grid = ModeInfoGrid::new(16, 16).unwrap();
    grid.insert(2, 4, inter(BlockSize::B8x8, above)).unwrap();
    grid.insert(4, 0, inter(BlockSize::B16x16, left)).unwrap();

    let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default());
    let found = ctx.find_mv_refs(4, 4, BlockSize::B8x8, MvRefTarget::Single(RefFrame::Last));

    let order: Vec<(Mv, u16)> = found.stack.iter().map(|c| (c.this_mv, c.weight)).collect();
    assert_eq!(order, [(left, 8 + REF_CAT_LEVEL), (above, 4 + REF_CAT_LEVEL)]);
}

#[test]
fn tile_boundary_hides_neighbours() {
    let mv = Mv::new(12, 12);
    let above = BlockInfo::inter(BlockSize::B16x16, PredictionMode::NearestMv, RefFrame::Last, mv);

    let mut grid = ModeInfoGrid::new(16, 16).unwrap();
    grid.insert(0, 4, above).unwrap();

    let refs = FrameRefs::default();
    let tile = TileInfo { mi_row_start: 4, mi_row_end: 16, mi_col_start: 0, mi_col_end: 16 };

    let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default()).with_tile(tile);
    let found = ctx.find_mv_refs(4, 4, BlockSize::B16x16, MvRefTarget::Single(RefFrame::Last));

    assert!(found.stack.is_empty());
    assert_eq!(found.mode_context.0, 0);
}

#[test]
fn intra_neighbours_are_ignored() {
    let mut grid = ModeInfoGrid::new(16, 16).unwrap();
    grid.insert(0, 4, BlockInfo::intra(BlockSize::B16x16, PredictionMode::DcPred)).unwrap();
    grid.insert(4, 0, BlockInfo::intra(BlockSize::B16x16, PredictionMode::DcPred)).unwrap();

    let refs = FrameRefs::default();
    let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default());

    for target in [
        MvRefTarget::Single(RefFrame::Last),
        MvRefTarget::Compound(RefFrame::Last, RefFrame::AltRef),
    ] {
        let found = ctx.find_mv_refs(4, 4, BlockSize::B16x16, target);
        assert_eq!(found.stack.nearest_count(), 0);
        assert_eq!(found.mode_context.0, 0);
    }
}

proptest! {
    #[test]
    fn candidate_stacks_are_ordered(
        seed in any::<u64>(),
        mi_row in 0usize..32,
        mi_col in 0usize..32,
        size_log2 in 0u32..5,
        target_idx in 0usize..4,
    ) {
        let grid = random_grid(seed, 32, 32);

        let size = 1usize << size_log2;
        let (mi_row, mi_col) = (mi_row & !(size - 1), mi_col & !(size - 1));
        let bsize = square(size);

        let target = match target_idx {
            0 => MvRefTarget::Single(RefFrame::Last),
            1 => MvRefTarget::Single(RefFrame::Golden),
            2 => MvRefTarget::Single(RefFrame::AltRef),
            _ => MvRefTarget::Compound(RefFrame::Last, RefFrame::BwdRef),
        };

        let refs = FrameRefs::default();
        let ctx = FrameMvContext::new(&grid, &refs, MvRefOptions::default());
        let found = ctx.find_mv_refs(mi_row, mi_col, bsize, target);

        let stack = found.stack.as_slice();
        let nearest = found.stack.nearest_count();

        prop_assert!(stack.len() <= 8);
        prop_assert!(nearest <= stack.len());

        prop_assert!(stack[..nearest].iter().all(|c| c.weight >= REF_CAT_LEVEL));
        prop_assert!(stack[..nearest].windows(2).all(|w| w[0].weight >= w[1].weight));
        prop_assert!(stack[nearest..].windows(2).all(|w| w[0].weight >= w[1].weight));

        for cand in stack {
            let clamp = |mv| clamp_mv_ref(mv, mi_row, mi_col, bsize, 32, 32);
            prop_assert_eq!(clamp(cand.this_mv), cand.this_mv);
            prop_assert_eq!(clamp(cand.comp_mv), cand.comp_mv);
        }

        if let MvRefTarget::Single(_) = target {
            for (idx, cand) in stack.iter().enumerate() {
                prop_assert!(stack[idx + 1..].iter().all(|other| other.this_mv != cand.this_mv));
            }
            if let Some(first) = stack.first() {
                prop_assert_eq!(found.mv_ref_list[0], first.this_mv);
            }
        }
        else {
            // Compound stacks are always completed to at least two pairs.
            prop_assert!(stack.len() >= 2);
        }
    }
}

#[test]
fn tx_sizes_follow_blocks() {
    let mut grid = ModeInfoGrid::new(8, 8).unwrap();
    let block = BlockInfo::intra(BlockSize::B16x16, PredictionMode::DcPred)
        .with_tx_size(TxSize::Tx8x8);

    grid.insert(4, 4, block).unwrap();

    assert_eq!(grid.tx_size_at(5, 6), Some(TxSize::Tx8x8));
    assert_eq!(grid.tx_size_at(0, 0), Some(TxSize::Tx4x4));
}
