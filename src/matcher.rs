//! Reconciles extracted statements with coverage profile blocks.

use log::debug;

use crate::model::{CoverageBlock, Function, FunctionCoverage};

/// Matches the statements of functions from one file against that file's
/// profile blocks. `None` means the profile has no entry for the file.
pub struct BlockMatcher<'a> {
    blocks: Option<&'a [CoverageBlock]>,
}

impl<'a> BlockMatcher<'a> {
    pub fn new(blocks: Option<&'a [CoverageBlock]>) -> Self {
        Self { blocks }
    }

    /// Add the hit count of every overlapping block to each statement.
    ///
    /// Matching is cumulative: a statement split across several blocks
    /// collects all of their hits.
    pub fn record_statements(&self, function: &mut Function) {
        let Some(blocks) = self.blocks else {
            return;
        };
        for statement in &mut function.statements {
            statement.executed_count = blocks
                .iter()
                .filter(|block| block.range.overlaps(&statement.range))
                .map(|block| block.hit_count)
                .fold(statement.executed_count, u64::saturating_add);
        }
    }

    /// Record statement hits, then derive the function's counts.
    pub fn record(&self, function: &mut Function) -> FunctionCoverage {
        self.record_statements(function);

        let ast_total = function.statements.len() as u64;
        let ast_covered = function.executed_statements();

        let mut coverage = FunctionCoverage {
            name: function.name.clone(),
            source_path: function.source_path.clone(),
            statement_count: ast_total,
            covered_count: 0,
        };

        let Some(blocks) = self.blocks else {
            return coverage;
        };

        let (block_total, block_covered) = blocks
            .iter()
            .filter(|block| block.range.overlaps(&function.range))
            .fold((0u64, 0u64), |(total, covered), block| {
                let covered = if block.hit_count > 0 {
                    covered.saturating_add(block.statement_count)
                } else {
                    covered
                };
                (total.saturating_add(block.statement_count), covered)
            });

        if block_total == ast_total {
            coverage.covered_count = block_covered;
        } else if block_total == 0 {
            // No profile data inside the function: excluded by build tags,
            // dead code, or the profile predates it.
            coverage.covered_count = ast_covered;
        } else {
            debug!(
                "function {} statement counts don't match profile: {} AST: {}",
                function.name, block_total, ast_total
            );
            coverage.statement_count = block_total;
            coverage.covered_count = block_covered;
        }

        coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Statement;
    use crate::position::Range;
    use std::path::PathBuf;

    fn r(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::from_coords((sl, sc), (el, ec))
    }

    fn block(range: Range, statement_count: u64, hit_count: u64) -> CoverageBlock {
        CoverageBlock {
            range,
            statement_count,
            hit_count,
        }
    }

    /// func Meow(x, y int) bool {
    ///   if x > y {
    ///       return true
    ///   }
    ///     return false
    /// }
    fn meow() -> Function {
        Function {
            name: "Meow".to_string(),
            source_path: PathBuf::from("foo/foo.go"),
            range: r(4, 1, 9, 2),
            statements: vec![
                Statement::new(r(5, 6, 5, 11)),
                Statement::new(r(6, 4, 6, 15)),
                Statement::new(r(8, 2, 8, 14)),
            ],
        }
    }

    #[test]
    fn test_whole_function_block() {
        let blocks = [block(r(4, 1, 9, 2), 3, 1)];
        let mut function = meow();
        let coverage = BlockMatcher::new(Some(&blocks)).record(&mut function);
        assert_eq!(coverage.statement_count, 3);
        assert_eq!(coverage.covered_count, 3);
        assert_eq!(coverage.percent(), 100.0);
        assert!(function.statements.iter().all(|s| s.executed_count == 1));
    }

    #[test]
    fn test_go_cover_style_blocks() {
        let blocks = [
            block(r(4, 26, 5, 12), 1, 1),
            block(r(5, 12, 7, 3), 1, 0),
            block(r(8, 2, 8, 14), 1, 1),
        ];
        let mut function = meow();
        let coverage = BlockMatcher::new(Some(&blocks)).record(&mut function);
        assert_eq!(coverage.statement_count, 3);
        assert_eq!(coverage.covered_count, 2);
        let hits: Vec<u64> = function.statements.iter().map(|s| s.executed_count).collect();
        assert_eq!(hits, vec![1, 0, 1]);
    }

    #[test]
    fn test_matching_is_cumulative() {
        // One statement split over two blocks collects both hit counts.
        let blocks = [block(r(6, 1, 6, 8), 1, 2), block(r(6, 8, 6, 20), 1, 5)];
        let mut function = meow();
        BlockMatcher::new(Some(&blocks)).record_statements(&mut function);
        assert_eq!(function.statements[1].executed_count, 7);
        assert_eq!(function.statements[0].executed_count, 0);
    }

    #[test]
    fn test_no_profile_for_file() {
        let mut function = meow();
        let coverage = BlockMatcher::new(None).record(&mut function);
        assert_eq!(coverage.statement_count, 3);
        assert_eq!(coverage.covered_count, 0);
        assert_eq!(coverage.percent(), 0.0);
    }

    #[test]
    fn test_no_blocks_inside_function_uses_ast_count() {
        let blocks = [block(r(20, 1, 30, 1), 4, 9)];
        let mut function = meow();
        let coverage = BlockMatcher::new(Some(&blocks)).record(&mut function);
        assert_eq!(coverage.statement_count, 3);
        assert_eq!(coverage.covered_count, 0);
        assert!(function.statements.iter().all(|s| s.executed_count == 0));
    }

    #[test]
    fn test_disagreement_prefers_profile() {
        let blocks = [block(r(4, 26, 9, 1), 4, 2)];
        let mut function = meow();
        let coverage = BlockMatcher::new(Some(&blocks)).record(&mut function);
        assert_eq!(coverage.statement_count, 4);
        assert_eq!(coverage.covered_count, 4);
    }

    #[test]
    fn test_block_touching_function_end_is_ignored() {
        let blocks = [block(r(9, 2, 12, 1), 2, 1)];
        let mut function = meow();
        let coverage = BlockMatcher::new(Some(&blocks)).record(&mut function);
        assert_eq!(coverage.statement_count, 3);
        assert_eq!(coverage.covered_count, 0);
    }

    #[test]
    fn test_oversized_statement_counts_saturate() {
        let blocks = [block(r(4, 26, 5, 12), u64::MAX, 1), block(r(8, 2, 8, 14), 1, 1)];
        let mut function = meow();
        let coverage = BlockMatcher::new(Some(&blocks)).record(&mut function);
        assert_eq!(coverage.statement_count, u64::MAX);
        assert_eq!(coverage.covered_count, u64::MAX);
        assert_eq!(coverage.percent(), 100.0);
    }

    #[test]
    fn test_hits_only_come_from_overlapping_blocks() {
        let blocks = [block(r(1, 1, 3, 1), 1, 10), block(r(10, 1, 11, 1), 1, 10)];
        let mut function = meow();
        BlockMatcher::new(Some(&blocks)).record_statements(&mut function);
        let total: u64 = function.statements.iter().map(|s| s.executed_count).sum();
        assert_eq!(total, 0);
        assert!(!blocks.iter().any(|b| b.range.overlaps(&function.range)));
    }
}
