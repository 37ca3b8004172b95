//! Overlapping line-window splitter.
//!
//! Windows grow line by line until the character budget is hit; the next
//! window re-includes enough trailing lines to cover the overlap budget, so
//! context spanning a boundary appears in both neighbours.

/// Chunking parameters. Identical content + identical parameters always
/// yield identical chunk boundaries.
#[derive(Debug, Clone)]
pub struct ChunkParams {
    /// Maximum non-whitespace characters per window.
    pub max_chars: usize,
    /// Non-whitespace characters of trailing context carried into the next
    /// window. Must be smaller than `max_chars`.
    pub overlap_chars: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            max_chars: 1500,
            overlap_chars: 200,
        }
    }
}

/// One window of the original file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutput {
    pub content: String,
    /// 1-based start line in the original file.
    pub start_line: usize,
    /// 1-based end line in the original file.
    pub end_line: usize,
}

/// Split `content` into overlapping line-aligned windows.
pub fn chunk_text(content: &str, params: &ChunkParams) -> Vec<ChunkOutput> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = content.lines().collect();
    let weights: Vec<usize> = lines.iter().map(|l| line_weight(l)).collect();
    let mut chunks = Vec::new();

    let mut start = 0usize;
    loop {
        // Grow the window until the budget is exhausted. A single oversized
        // line still becomes its own window.
        let mut end = start;
        let mut chars = weights[start];
        while end + 1 < lines.len() && chars + weights[end + 1] <= params.max_chars {
            end += 1;
            chars += weights[end];
        }

        chunks.push(ChunkOutput {
            content: lines[start..=end].join("\n"),
            start_line: start + 1,
            end_line: end + 1,
        });

        if end + 1 >= lines.len() {
            break;
        }

        // Back up over trailing lines to build the overlap, but always
        // advance past the previous start so the walk terminates.
        let mut next = end + 1;
        let mut overlap = 0usize;
        while next > start + 1 && overlap + weights[next - 1] <= params.overlap_chars {
            next -= 1;
            overlap += weights[next];
        }
        start = next;
    }

    // Windows that are pure whitespace (runs of blank lines) carry no
    // retrievable content.
    chunks.retain(|c| !c.content.trim().is_empty());
    chunks
}

fn line_weight(line: &str) -> usize {
    line.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_chars: usize, overlap_chars: usize) -> ChunkParams {
        ChunkParams {
            max_chars,
            overlap_chars,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", &ChunkParams::default()).is_empty());
        assert!(chunk_text("   \n\n  ", &ChunkParams::default()).is_empty());
    }

    #[test]
    fn test_small_file_single_chunk() {
        let chunks = chunk_text("line 1\nline 2\nline 3", &ChunkParams::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
        assert_eq!(chunks[0].content, "line 1\nline 2\nline 3");
    }

    #[test]
    fn test_splits_when_over_budget() {
        let content: Vec<String> = (0..20).map(|i| format!("line_{i}_aaaaaaaa")).collect();
        let content = content.join("\n");
        let chunks = chunk_text(&content, &params(60, 0));
        assert!(chunks.len() > 1);
        // First chunk starts at line 1, last chunk ends at line 20
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks.last().unwrap().end_line, 20);
    }

    #[test]
    fn test_windows_overlap() {
        let content: Vec<String> = (0..12).map(|i| format!("word{i}abcd")).collect();
        let content = content.join("\n");
        // ~9 chars per line; 3 lines per window, ~1 line of overlap
        let chunks = chunk_text(&content, &params(30, 10));
        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            // Next window starts at or before the previous end + 1, and when
            // overlap is in effect it re-includes the previous tail line.
            assert!(pair[1].start_line <= pair[0].end_line + 1);
            assert!(pair[1].start_line > pair[0].start_line);
        }
        // At least one boundary actually overlaps
        assert!(chunks
            .windows(2)
            .any(|p| p[1].start_line <= p[0].end_line));
    }

    #[test]
    fn test_zero_overlap_windows_are_disjoint() {
        let content: Vec<String> = (0..10).map(|i| format!("abcdefgh{i}")).collect();
        let content = content.join("\n");
        let chunks = chunk_text(&content, &params(27, 0));
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_line, pair[0].end_line + 1);
        }
    }

    #[test]
    fn test_oversized_single_line_is_its_own_chunk() {
        let content = format!("{}\nshort", "x".repeat(5000));
        let chunks = chunk_text(&content, &params(100, 10));
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 1);
        assert!(chunks[0].content.len() >= 5000);
    }

    #[test]
    fn test_boundaries_are_deterministic() {
        let content: Vec<String> = (0..100)
            .map(|i| format!("fn function_{i}() {{ body_{i} }}"))
            .collect();
        let content = content.join("\n");
        let p = ChunkParams::default();
        assert_eq!(chunk_text(&content, &p), chunk_text(&content, &p));
    }

    #[test]
    fn test_every_line_is_covered() {
        let content: Vec<String> = (0..50).map(|i| format!("content line {i}")).collect();
        let content = content.join("\n");
        let chunks = chunk_text(&content, &params(80, 20));
        let mut covered = vec![false; 50];
        for c in &chunks {
            for line in c.start_line..=c.end_line {
                covered[line - 1] = true;
            }
        }
        assert!(covered.iter().all(|v| *v));
    }
}
