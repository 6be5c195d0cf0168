use crate::store::models::TextChunk;

/// One retrieval hit: the chunk text plus its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
    pub sequence_index: usize,
}

/// Cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Rank chunks against a query embedding, best first. Ties keep document
/// order so repeated queries stay deterministic.
pub fn top_k(query: &[f32], chunks: &[TextChunk], k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .map(|c| ScoredChunk {
            text: c.text.clone(),
            score: cosine_similarity(query, &c.embedding),
            sequence_index: c.sequence_index,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.sequence_index.cmp(&b.sequence_index))
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(seq: usize, embedding: Vec<f32>) -> TextChunk {
        TextChunk {
            text: format!("chunk {}", seq),
            embedding,
            sequence_index: seq,
        }
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_top_k_ranks_by_similarity() {
        let chunks = vec![
            chunk(0, vec![1.0, 0.0]),
            chunk(1, vec![0.0, 1.0]),
            chunk(2, vec![0.7, 0.7]),
        ];
        let hits = top_k(&[1.0, 0.0], &chunks, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].sequence_index, 0);
        assert_eq!(hits[1].sequence_index, 2);
    }

    #[test]
    fn test_top_k_tie_keeps_document_order() {
        let chunks = vec![
            chunk(5, vec![1.0, 0.0]),
            chunk(2, vec![1.0, 0.0]),
            chunk(9, vec![1.0, 0.0]),
        ];
        let hits = top_k(&[1.0, 0.0], &chunks, 3);
        let order: Vec<usize> = hits.iter().map(|h| h.sequence_index).collect();
        assert_eq!(order, vec![2, 5, 9]);
    }

    #[test]
    fn test_top_k_truncates_to_available() {
        let chunks = vec![chunk(0, vec![1.0, 0.0])];
        assert_eq!(top_k(&[1.0, 0.0], &chunks, 3).len(), 1);
        assert!(top_k(&[1.0, 0.0], &chunks, 0).is_empty());
    }
}
