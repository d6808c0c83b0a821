use std::sync::Arc;

use board::{BoardState, Grid, Piece, Square};
use image::{imageops, GrayImage};
use log::{debug, warn};
use rayon::prelude::*;

use crate::detector::{assemble, LastMove};
use crate::{
    best_score, find_matches, BoardDetector, DetectionFailure, DetectorSettings, PatternLibrary,
    Region, Snapshot,
};

/// Reads raster captures by matching the pattern library against them.
pub struct TemplateDetector {
    patterns: Arc<PatternLibrary>,
    settings: DetectorSettings,
    last_anchor: Option<Region>,
}

impl TemplateDetector {
    pub fn new(patterns: Arc<PatternLibrary>, settings: DetectorSettings) -> Self {
        Self {
            patterns,
            settings,
            last_anchor: None,
        }
    }

    fn scan_image(&mut self, image: &GrayImage) -> Result<BoardState, DetectionFailure> {
        let anchor = self.locate_board(image)?;
        let board =
            imageops::crop_imm(image, anchor.x, anchor.y, anchor.width, anchor.height).to_image();

        let grid = self.classify_cells(&board);
        let last_move = self.find_last_move(&board, &grid);
        assemble(grid, last_move)
    }

    /// The single anchor match. Looks near the previous one first.
    fn locate_board(&mut self, image: &GrayImage) -> Result<Region, DetectionFailure> {
        let bounds = Region::of(image);

        if let Some(last) = self.last_anchor {
            let near = last.expand(self.settings.anchor_search_margin, &bounds);
            if let [found] = self.match_anchor(image, near).as_slice() {
                self.last_anchor = Some(*found);
                return Ok(*found);
            }
            debug!("Board moved away from {:?}", last);
        }

        match self.match_anchor(image, bounds).as_slice() {
            [found] => {
                self.last_anchor = Some(*found);
                Ok(*found)
            }
            matches => {
                if matches.len() > 1 {
                    debug!("Found {} boards, expected one", matches.len());
                }
                self.last_anchor = None;
                Err(DetectionFailure::NoBoardFound)
            }
        }
    }

    fn match_anchor(&self, image: &GrayImage, search: Region) -> Vec<Region> {
        find_matches(
            image,
            self.patterns.anchor(),
            search,
            self.settings.anchor_threshold,
            self.settings.overlap_threshold,
        )
        .into_iter()
        .map(|m| m.region)
        .collect()
    }

    fn classify_cells(&self, board: &GrayImage) -> Grid {
        let squares: Vec<Square> = Square::all().collect();
        let pieces: Vec<(Square, Option<Piece>)> = squares
            .par_iter()
            .map(|&square| (square, self.classify(board, square)))
            .collect();

        let mut grid: Grid = Default::default();
        for (square, piece) in pieces {
            grid[square.row][square.col] = piece;
        }
        grid
    }

    /// First template in iteration order that matches inside the cell.
    fn classify(&self, board: &GrayImage, square: Square) -> Option<Piece> {
        let window = self.patterns.geometry().cell_region(square);
        let mut matched = self.patterns.pieces().iter().filter(|p| {
            best_score(board, &p.template, window)
                .is_some_and(|score| score >= self.settings.piece_threshold)
        });

        let winner = matched.next()?;
        if let Some(other) = matched.next() {
            warn!(
                "Duplicated piece found at {}: {} -> {}",
                square,
                winner.piece.symbol(),
                other.piece.symbol()
            );
        }
        Some(winner.piece)
    }

    fn find_last_move(&self, board: &GrayImage, grid: &Grid) -> LastMove {
        let geometry = self.patterns.geometry();
        let mut highlighted: Vec<Square> = find_matches(
            board,
            self.patterns.marker(),
            Region::of(board),
            self.settings.marker_threshold,
            self.settings.overlap_threshold,
        )
        .into_iter()
        .filter_map(|m| {
            let (x, y) = m.region.center();
            geometry.square_at(x, y)
        })
        .collect();
        highlighted.sort_by_key(|square| (square.row, square.col));
        highlighted.dedup();

        let mut last_move = LastMove::default();
        for square in highlighted {
            last_move.mark(square, grid[square.row][square.col]);
        }
        last_move
    }
}

impl BoardDetector for TemplateDetector {
    fn scan(&mut self, snapshot: &Snapshot) -> Result<BoardState, DetectionFailure> {
        match snapshot {
            Snapshot::Raster(image) => self.scan_image(image),
            other => Err(DetectionFailure::UnsupportedSnapshot(other.kind())),
        }
    }
}
