use rand::Rng;
use std::time::Duration;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_ROWS: usize = 20;
pub const DEFAULT_COLUMNS: usize = 10;
pub const DEFAULT_FALL_INTERVAL: Duration = Duration::from_millis(300);

/// Startup parameters supplied by the host. Cell pixel size is a host
/// concern and not part of the core.
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    pub rows: usize,
    pub columns: usize,
    pub fall_interval: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            fall_interval: DEFAULT_FALL_INTERVAL,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

pub const SHAPE_SIZE: usize = 4;

/// A piece's 4×4 occupancy grid. Occupied cells carry the kind tag, so the
/// tag survives rotation along with the occupancy.
pub type Shape = [[Cell; SHAPE_SIZE]; SHAPE_SIZE];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PieceKind {
    I,
    LLeft,
    LRight,
    ZLeft,
    ZRight,
    T,
    Box,
}

pub const PIECE_KINDS: [PieceKind; 7] = [
    PieceKind::I,
    PieceKind::LLeft,
    PieceKind::LRight,
    PieceKind::ZLeft,
    PieceKind::ZRight,
    PieceKind::T,
    PieceKind::Box,
];

impl PieceKind {
    fn occupancy(self) -> [[u8; SHAPE_SIZE]; SHAPE_SIZE] {
        match self {
            PieceKind::I => [
                [0, 0, 1, 0],
                [0, 0, 1, 0],
                [0, 0, 1, 0],
                [0, 0, 1, 0],
            ],
            PieceKind::LLeft => [
                [0, 0, 1, 0],
                [0, 0, 1, 0],
                [0, 1, 1, 0],
                [0, 0, 0, 0],
            ],
            PieceKind::LRight => [
                [0, 1, 0, 0],
                [0, 1, 0, 0],
                [0, 1, 1, 0],
                [0, 0, 0, 0],
            ],
            PieceKind::ZLeft => [
                [0, 0, 0, 0],
                [0, 0, 1, 1],
                [0, 1, 1, 0],
                [0, 0, 0, 0],
            ],
            PieceKind::ZRight => [
                [0, 0, 0, 0],
                [1, 1, 0, 0],
                [0, 1, 1, 0],
                [0, 0, 0, 0],
            ],
            PieceKind::T => [
                [0, 0, 0, 0],
                [0, 1, 1, 1],
                [0, 0, 1, 0],
                [0, 0, 0, 0],
            ],
            PieceKind::Box => [
                [0, 0, 0, 0],
                [0, 1, 1, 0],
                [0, 1, 1, 0],
                [0, 0, 0, 0],
            ],
        }
    }

    /// A fresh copy of this kind's template grid. Every occupied cell is
    /// tagged with the kind itself.
    pub fn template(self) -> Shape {
        let occupancy = self.occupancy();
        let mut shape = [[Cell::Empty; SHAPE_SIZE]; SHAPE_SIZE];
        for i in 0..SHAPE_SIZE {
            for j in 0..SHAPE_SIZE {
                if occupancy[i][j] != 0 {
                    shape[i][j] = Cell::Filled(self);
                }
            }
        }
        shape
    }

    fn random() -> Self {
        let mut rng = rand::thread_rng();
        PIECE_KINDS[rng.gen_range(0..PIECE_KINDS.len())]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    Empty,
    Filled(PieceKind),
}

impl Cell {
    pub fn is_occupied(self) -> bool {
        self != Cell::Empty
    }
}

/// Discrete player input recognized by the driver.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
}

// ============================================================================
// Active Piece
// ============================================================================

/// The currently falling piece: a mutable copy of a template grid plus the
/// board-coordinate position of the grid's top-left corner. The anchor may
/// sit outside the board (x negative, for instance) as long as all occupied
/// cells stay in range.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ActivePiece {
    pub shape: Shape,
    pub x: i16,
    pub y: i16,
}

impl ActivePiece {
    /// A new piece at the top-center spawn position. The template is copied,
    /// never aliased: rotation mutates the piece's own grid.
    pub fn spawn(kind: PieceKind, columns: usize) -> Self {
        Self {
            shape: kind.template(),
            x: (columns as i16 / 2) - 2,
            y: 0,
        }
    }

    pub fn at(kind: PieceKind, x: i16, y: i16) -> Self {
        Self {
            shape: kind.template(),
            x,
            y,
        }
    }

    /// Raw coordinate update. Validity is always the caller's problem.
    pub fn translate(&mut self, dx: i16, dy: i16) {
        self.x += dx;
        self.y += dy;
    }

    /// Rotates the shape grid 90° clockwise in place, transpose followed by
    /// column reversal. Four applications restore the original grid. Invalid
    /// results are the caller's to revert; there is no kick search.
    pub fn rotate(&mut self) {
        let old = self.shape;
        for i in 0..SHAPE_SIZE {
            for j in 0..SHAPE_SIZE {
                self.shape[i][j] = old[SHAPE_SIZE - 1 - j][i];
            }
        }
    }

    /// Absolute (row, col, kind) for every occupied cell of the shape grid.
    pub fn cells(&self) -> Vec<(i16, i16, PieceKind)> {
        let mut cells = Vec::with_capacity(SHAPE_SIZE);
        for i in 0..SHAPE_SIZE {
            for j in 0..SHAPE_SIZE {
                if let Cell::Filled(kind) = self.shape[i][j] {
                    cells.push((self.y + i as i16, self.x + j as i16, kind));
                }
            }
        }
        cells
    }
}

// ============================================================================
// Board
// ============================================================================

/// The settled-cell grid. Owned by a `Game` instance; mutated only by
/// merging a resting piece and by row clearing.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    rows: usize,
    columns: usize,
    cells: Vec<Vec<Cell>>,
}

impl Board {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![vec![Cell::Empty; columns]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Answers only for in-range coordinates; callers bounds-check first and
    /// treat out-of-range as blocked.
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cells[row][col].is_occupied()
    }

    pub fn set_cell(&mut self, row: usize, col: usize, kind: PieceKind) {
        self.cells[row][col] = Cell::Filled(kind);
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(|cell| cell.is_occupied())
    }

    /// Fixes every occupied cell of the piece into the grid. No validity
    /// check: the caller guarantees the placement is in bounds and
    /// non-overlapping. Cells still above row 0 are skipped.
    pub fn merge_piece(&mut self, piece: &ActivePiece) {
        for (row, col, kind) in piece.cells() {
            if row >= 0 && (row as usize) < self.rows {
                self.cells[row as usize][col as usize] = Cell::Filled(kind);
            }
        }
    }

    /// Scans rows top to bottom; each full row found is compacted away
    /// immediately: every row above it shifts down by one and row 0 is
    /// emptied. The scan then continues forward from the next index rather
    /// than re-checking the shifted contents, which reproduces the original
    /// single-pass behavior when several rows are full at once.
    pub fn clear_full_rows_and_compact(&mut self) {
        for row in 0..self.rows {
            if !self.is_row_full(row) {
                continue;
            }
            for r in (1..=row).rev() {
                let above = self.cells[r - 1].clone();
                self.cells[r] = above;
            }
            for cell in &mut self.cells[0] {
                *cell = Cell::Empty;
            }
        }
    }

    /// True iff every occupied cell has its column in range, its row above
    /// the floor, and does not overlap a settled cell. Rows above the board
    /// (row < 0) are allowed: a freshly spawned piece may still hang over
    /// the top edge.
    pub fn is_valid_placement(&self, piece: &ActivePiece) -> bool {
        for (row, col, _) in piece.cells() {
            if col < 0 || col >= self.columns as i16 {
                return false;
            }
            if row >= self.rows as i16 {
                return false;
            }
            if row >= 0 && self.is_occupied(row as usize, col as usize) {
                return false;
            }
        }
        true
    }

    /// True iff ANY occupied cell sits on the bottom row or directly above a
    /// settled cell. One touching column halts the whole piece.
    pub fn is_resting(&self, piece: &ActivePiece) -> bool {
        for (row, col, _) in piece.cells() {
            if row == self.rows as i16 - 1 {
                return true;
            }
            let below = row + 1;
            if below >= 0
                && below < self.rows as i16
                && col >= 0
                && col < self.columns as i16
                && self.is_occupied(below as usize, col as usize)
            {
                return true;
            }
        }
        false
    }

    /// Whether a fresh piece of the given kind would fit at the spawn
    /// position. Extension point for hosts that want top-out detection; the
    /// driver itself never calls it.
    pub fn can_spawn(&self, kind: PieceKind) -> bool {
        self.is_valid_placement(&ActivePiece::spawn(kind, self.columns))
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> PieceKind;
}

/// Uniform 1/7 draw per spawn, independent across calls. No bag fairness.
struct RandomPieceProvider;

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        PieceKind::random()
    }
}

pub struct SequencePieceProvider {
    pieces: Vec<PieceKind>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<PieceKind>) -> Self {
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

// ============================================================================
// Game
// ============================================================================

/// The single owner of the board and the active piece. The host drives it
/// with `handle_input` for discrete events and `advance_tick` once per fall
/// interval; everything else is read access for drawing.
pub struct Game {
    pub board: Board,
    pub piece: ActivePiece,
    fall_interval: Duration,
    provider: Box<dyn PieceProvider>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self::with_provider(config, Box::new(RandomPieceProvider))
    }

    pub fn with_provider(config: GameConfig, mut provider: Box<dyn PieceProvider>) -> Self {
        let board = Board::new(config.rows, config.columns);
        let piece = ActivePiece::spawn(provider.next_piece(), config.columns);
        Self {
            board,
            piece,
            fall_interval: config.fall_interval,
            provider,
        }
    }

    /// A game over a prepared board and piece, for tests and scenarios.
    pub fn with_board(board: Board, piece: ActivePiece) -> Self {
        Self {
            board,
            piece,
            fall_interval: DEFAULT_FALL_INTERVAL,
            provider: Box::new(RandomPieceProvider),
        }
    }

    pub fn fall_interval(&self) -> Duration {
        self.fall_interval
    }

    /// Applies one discrete command via snapshot / transform / validate /
    /// revert. Returns whether the piece actually changed; an invalid
    /// transform is silently rolled back, never reported as an error.
    pub fn handle_input(&mut self, command: Command) -> bool {
        let snapshot = self.piece.clone();
        match command {
            Command::MoveLeft => self.piece.translate(-1, 0),
            Command::MoveRight => self.piece.translate(1, 0),
            Command::Rotate => self.piece.rotate(),
            // Recognized but without effect in the current mechanics.
            Command::SoftDrop => return false,
        }
        if self.board.is_valid_placement(&self.piece) {
            true
        } else {
            self.piece = snapshot;
            false
        }
    }

    /// One gravity step. A resting piece is merged into the board, full rows
    /// are cleared and compacted, and the next piece spawns; otherwise the
    /// piece descends one row. The descent needs no re-validation since
    /// resting already excluded the blocked case.
    pub fn advance_tick(&mut self) {
        if self.board.is_resting(&self.piece) {
            self.board.merge_piece(&self.piece);
            self.board.clear_full_rows_and_compact();
            self.piece = ActivePiece::spawn(self.provider.next_piece(), self.board.columns());
        } else {
            self.piece.translate(0, 1);
        }
    }

    pub fn can_spawn(&self, kind: PieceKind) -> bool {
        self.board.can_spawn(kind)
    }

    /// The board with the active piece overlaid, ready for drawing.
    pub fn render_cells(&self) -> Vec<Vec<Cell>> {
        let mut visual = Vec::with_capacity(self.board.rows());
        for row in 0..self.board.rows() {
            let mut line = Vec::with_capacity(self.board.columns());
            for col in 0..self.board.columns() {
                line.push(self.board.cell(row, col));
            }
            visual.push(line);
        }
        for (row, col, kind) in self.piece.cells() {
            if row >= 0
                && (row as usize) < self.board.rows()
                && col >= 0
                && (col as usize) < self.board.columns()
            {
                visual[row as usize][col as usize] = Cell::Filled(kind);
            }
        }
        visual
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    pub fn empty_board() -> Board {
        Board::new(DEFAULT_ROWS, DEFAULT_COLUMNS)
    }

    pub fn fill_row(board: &mut Board, row: usize) {
        for col in 0..board.columns() {
            board.set_cell(row, col, PieceKind::T);
        }
    }

    pub fn fill_row_with_gap(board: &mut Board, row: usize, gap_col: usize) {
        for col in 0..board.columns() {
            if col != gap_col {
                board.set_cell(row, col, PieceKind::T);
            }
        }
    }
}
