use scatter_life::grid::PaddedGrid;
use scatter_life::serial::SerialLife;

fn assert_alive(engine: &SerialLife, cells: &[(usize, usize)]) {
    for &(x, y) in cells {
        assert!(engine.get_cell(x, y), "expected alive at ({x},{y})");
    }
}

fn collect_live(grid: &PaddedGrid) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    grid.for_each_live(|x, y| out.push((x, y)));
    out
}

fn reference_count(grid: &PaddedGrid, x: usize, y: usize) -> u8 {
    let mut n = 0;
    for ny in y.saturating_sub(1)..=(y + 1).min(grid.height() - 1) {
        for nx in x.saturating_sub(1)..=(x + 1).min(grid.width() - 1) {
            if (nx, ny) != (x, y) && grid.get(nx, ny) {
                n += 1;
            }
        }
    }
    n
}

#[test]
fn adjacent_pair_dies_out() {
    // 4x4 interior, padded to 6x6.
    let mut engine = SerialLife::new(PaddedGrid::from_live_cells(4, 4, [(1, 1), (2, 1)]));
    assert_eq!(engine.grid().read().len(), 36);

    let counts = engine.neighbor_counts();
    let stride = engine.grid().stride();
    assert_eq!(counts[stride + 2], 1);
    assert_eq!(counts[stride + 3], 1);
    // Cells touching both have two neighbors: not enough for a birth.
    assert_eq!(counts[2 * stride + 2], 2);

    engine.step();
    assert_eq!(engine.grid().render(), "oooo\noooo\noooo\noooo\n");
    assert_eq!(engine.population(), 0);
}

#[test]
fn blinker_on_small_grid_has_exact_bitmap() {
    let mut engine = SerialLife::new(PaddedGrid::from_live_cells(4, 4, [(0, 1), (1, 1), (2, 1)]));

    engine.step();
    assert_eq!(engine.grid().render(), "oxoo\noxoo\noxoo\noooo\n");

    engine.step();
    assert_eq!(engine.grid().render(), "oooo\nxxxo\noooo\noooo\n");
}

#[test]
fn block_in_corner_is_stable() {
    let block = [(0, 0), (1, 0), (0, 1), (1, 1)];
    let mut engine = SerialLife::new(PaddedGrid::from_live_cells(5, 3, block));
    engine.step_n(3);
    assert_alive(&engine, &block);
    assert_eq!(engine.population(), 4);
}

#[test]
fn isolated_cells_vanish() {
    let cells = [(0, 0), (3, 3), (6, 0), (0, 6), (6, 6)];
    let mut engine = SerialLife::new(PaddedGrid::from_live_cells(7, 7, cells));
    engine.step();
    assert_eq!(engine.population(), 0);
    engine.step();
    assert_eq!(engine.population(), 0);
}

#[test]
fn neighbor_counts_match_reference_on_random_grid() {
    let engine = SerialLife::initialize(17, 11, 0xC0FFEE);
    let grid = engine.grid();
    let counts = engine.neighbor_counts();
    let stride = grid.stride();
    for (i, &count) in counts.iter().enumerate() {
        let col = i % stride;
        if col == 0 || col == stride - 1 {
            assert_eq!(count, 0, "border position {i}");
            continue;
        }
        let (x, y) = (col - 1, i / stride);
        assert_eq!(count, reference_count(grid, x, y), "count at ({x},{y})");
    }
}

#[test]
fn glider_walks_toward_the_far_corner() {
    let glider = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
    let mut engine = SerialLife::new(PaddedGrid::from_live_cells(10, 10, glider));
    engine.step_n(4);
    let shifted: Vec<_> = glider.iter().map(|&(x, y)| (x + 1, y + 1)).collect();
    let mut live = collect_live(engine.grid());
    live.sort_by_key(|&(x, y)| (y, x));
    let mut expected = shifted.clone();
    expected.sort_by_key(|&(x, y)| (y, x));
    assert_eq!(live, expected);
    assert_eq!(engine.generation(), 4);
}

#[test]
fn run_persists_every_generation() {
    let mut engine = SerialLife::initialize(8, 8, 5);
    let mut frames: Vec<String> = Vec::new();
    let report = engine.run(3, &mut frames).unwrap();
    assert_eq!(report.generations, 3);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[2], engine.grid().render());
}
