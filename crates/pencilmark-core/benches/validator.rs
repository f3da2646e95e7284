//! Benchmarks for live grid validation.
//!
//! Validation runs on every grid mutation, so this suite tracks its cost on
//! typical board states.
//!
//! # Running
//!
//! ```sh
//! cargo bench --bench validator
//! ```

use std::hint;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pencilmark_core::{Cell, CellMarks, Constraints, Grid, MarkSet, grid_errors};

const SOLUTION: &str =
    "185362947793148526246795183564239871931874265827516394318427659672951438459683712";

fn solved_grid() -> Grid {
    let digits: Vec<u8> = SOLUTION.bytes().map(|b| b - b'0').collect();
    Grid::from_rows(digits.chunks(9).map(<[u8]>::to_vec).collect()).unwrap()
}

fn half_filled_grid() -> Grid {
    let mut grid = solved_grid();
    for cell in Cell::all(9).filter(|cell| (cell.row + cell.col) % 2 == 0) {
        grid.set(cell, 0);
    }
    grid
}

fn full_marks() -> CellMarks {
    let mut marks = CellMarks::new(9);
    let all: MarkSet = (1..=9).collect();
    for cell in Cell::all(9) {
        marks.set(cell, all);
    }
    marks
}

fn bench_grid_errors(c: &mut Criterion) {
    let classic = Constraints::classic(9);
    let killer = Constraints::builder(9)
        .rows()
        .columns()
        .boxes()
        .cage([Cell::new(0, 0), Cell::new(0, 1)], 9)
        .cage([Cell::new(4, 4), Cell::new(4, 5), Cell::new(5, 4)], 12)
        .thermometer([Cell::new(8, 0), Cell::new(7, 0), Cell::new(6, 0)])
        .build()
        .unwrap();
    let marks = full_marks();

    let cases = [
        ("classic_solved", &classic, solved_grid()),
        ("classic_half", &classic, half_filled_grid()),
        ("killer_half", &killer, half_filled_grid()),
    ];

    for (param, constraints, grid) in cases {
        c.bench_with_input(
            BenchmarkId::new("grid_errors", param),
            &grid,
            |b, grid| {
                b.iter(|| {
                    let errors = grid_errors(true, constraints, grid, Some(&marks));
                    hint::black_box(errors)
                });
            },
        );
    }
}

criterion_group!(benches, bench_grid_errors);
criterion_main!(benches);
