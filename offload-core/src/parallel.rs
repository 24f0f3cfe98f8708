//! Pool de workers para varreduras de parâmetros
//!
//! Cada ponto da varredura é um pipeline independente. Os jobs entram numa
//! fila MPMC (crossbeam) consumida por threads com escopo; os resultados
//! voltam por outro canal e são reordenados pelo índice. Nenhum acumulador
//! mutável é compartilhado entre pontos.

use crossbeam_channel::unbounded;

/// Paralelismo disponível na máquina
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Executa `job` sobre cada item e devolve os resultados alinhados ao índice
///
/// Um panic num worker é propagado para quem chamou.
pub fn run_indexed<T, R, F>(items: Vec<T>, workers: usize, job: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(usize, T) -> R + Sync,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, total);

    let (job_tx, job_rx) = unbounded::<(usize, T)>();
    let (result_tx, result_rx) = unbounded::<(usize, R)>();

    for (index, item) in items.into_iter().enumerate() {
        // job_rx segue vivo até o fim da função
        let _ = job_tx.send((index, item));
    }
    drop(job_tx);

    let job = &job;
    crossbeam_utils::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move |_| {
                for (index, item) in job_rx.iter() {
                    let _ = result_tx.send((index, job(index, item)));
                }
            });
        }
    })
    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
    drop(result_tx);

    let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
    for (index, result) in result_rx.try_iter() {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_are_index_aligned() {
        let items: Vec<u64> = (0..100).collect();
        let results = run_indexed(items, 4, |index, item| (index as u64, item * item));

        assert_eq!(results.len(), 100);
        for (i, (index, square)) in results.iter().enumerate() {
            assert_eq!(*index, i as u64);
            assert_eq!(*square, (i * i) as u64);
        }
    }

    #[test]
    fn test_single_worker_and_empty_input() {
        let results = run_indexed(vec!["a", "bb", "ccc"], 1, |_, s| s.len());
        assert_eq!(results, vec![1, 2, 3]);

        let empty: Vec<usize> = run_indexed(Vec::<usize>::new(), 8, |_, x| x);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_more_workers_than_items() {
        let results = run_indexed(vec![1, 2], 64, |_, x| x * 10);
        assert_eq!(results, vec![10, 20]);
    }

    #[test]
    #[should_panic]
    fn test_worker_panic_propagates() {
        run_indexed(vec![1, 2, 3], 2, |_, x: i32| {
            if x == 2 {
                panic!("boom");
            }
            x
        });
    }
}
