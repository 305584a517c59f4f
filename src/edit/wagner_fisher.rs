use super::{Alignment, Coord, EditOperation, OperationSet};

///Row-major table of the cheapest cost of reaching each cell of the edit grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    columns: usize,
    cells: Vec<f64>,
}

impl CostMatrix {
    fn new(rows: usize, columns: usize) -> Self {
        CostMatrix {
            rows,
            columns,
            cells: vec![0.0; rows * columns],
        }
    }

    ///The cost stored at `(i, j)`. Coordinates below zero read as 0.
    pub fn cost(&self, i: isize, j: isize) -> f64 {
        if i < 0 || j < 0 {
            0.0
        } else {
            self[(i as usize, j as usize)]
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }
}

impl std::ops::Index<Coord> for CostMatrix {
    type Output = f64;

    fn index(&self, (i, j): Coord) -> &Self::Output {
        &self.cells[i * self.columns + j]
    }
}

impl std::ops::IndexMut<Coord> for CostMatrix {
    fn index_mut(&mut self, (i, j): Coord) -> &mut Self::Output {
        &mut self.cells[i * self.columns + j]
    }
}

///A minimum cost alignment between two sequences, found by dynamic programming.
#[derive(Debug, Clone, PartialEq)]
pub struct WagnerFisher {
    matrix: CostMatrix,
    alignment: Alignment,
}

impl WagnerFisher {
    pub fn new<T: PartialEq>(first: &[T], second: &[T], operations: OperationSet) -> Self {
        let operations = operations.operations();
        let mut matrix = CostMatrix::new(first.len() + 1, second.len() + 1);
        for i in 0..=first.len() {
            for j in 0..=second.len() {
                if (i, j) != (0, 0) {
                    matrix[(i, j)] = cheapest(&matrix, &operations, first, second, (i, j)).0;
                }
            }
        }

        let mut alignment = vec![];
        let mut coord = (first.len(), second.len());
        while coord != (0, 0) {
            let (_, op, previous) = cheapest(&matrix, &operations, first, second, coord);
            alignment.push(op);
            coord = previous;
        }
        alignment.reverse();

        WagnerFisher { matrix, alignment }
    }

    pub fn alignment(&self) -> &[EditOperation] {
        &self.alignment
    }

    pub fn into_alignment(self) -> Alignment {
        self.alignment
    }

    pub fn matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    ///The cost of the whole alignment.
    pub fn distance(&self) -> f64 {
        let (rows, columns) = self.matrix.shape();
        self.matrix[(rows - 1, columns - 1)]
    }
}

///Picks the operation that reaches `coord` most cheaply; earlier operations win ties.
fn cheapest<T: PartialEq>(
    matrix: &CostMatrix,
    operations: &[EditOperation],
    first: &[T],
    second: &[T],
    coord: Coord,
) -> (f64, EditOperation, Coord) {
    let mut best: Option<(f64, EditOperation, Coord)> = None;
    for op in operations {
        if let Some(previous) = op.previous(coord) {
            let cost = matrix[previous] + op.cost(first, second, coord);
            if best.is_none_or(|(b, _, _)| cost < b) {
                best = Some((cost, *op, previous));
            }
        }
    }
    best.expect("Insert and Delete reach every cell except the origin")
}
