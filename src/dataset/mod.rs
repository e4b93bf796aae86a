//! In-process partitioned collection.
//!
//! Every pipeline stage consumes one `Dataset` and produces a new one; nothing
//! is mutated in place. Partitions are processed in parallel on the current
//! rayon pool and element order is preserved across `map` and `flat_map`,
//! so a pipeline over the same input always yields the same output.

use rayon::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Dataset<T> {
    partitions: Vec<Vec<T>>,
}

impl<T: Send> Dataset<T> {
    /// Split `items` into at most `num_partitions` contiguous, evenly sized partitions.
    pub fn from_vec(items: Vec<T>, num_partitions: usize) -> Self {
        let num_partitions = num_partitions.max(1);
        if items.is_empty() {
            return Self { partitions: Vec::new() };
        }

        let chunk_size = items.len().div_ceil(num_partitions);
        let mut partitions = Vec::with_capacity(num_partitions);
        let mut items = items.into_iter().peekable();
        while items.peek().is_some() {
            partitions.push(items.by_ref().take(chunk_size).collect());
        }

        Self { partitions }
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn len(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(Vec::is_empty)
    }

    pub fn map<U, F>(self, f: F) -> Dataset<U>
    where
        U: Send,
        F: Fn(T) -> U + Sync + Send,
    {
        let partitions = self
            .partitions
            .into_par_iter()
            .map(|partition| partition.into_iter().map(&f).collect())
            .collect();
        Dataset { partitions }
    }

    pub fn flat_map<U, I, F>(self, f: F) -> Dataset<U>
    where
        U: Send,
        I: IntoIterator<Item = U>,
        F: Fn(T) -> I + Sync + Send,
    {
        let partitions = self
            .partitions
            .into_par_iter()
            .map(|partition| partition.into_iter().flat_map(&f).collect())
            .collect();
        Dataset { partitions }
    }

    /// Pair every element with every element of the broadcast side `other`.
    ///
    /// `f` sees borrowed halves, so pairs are never materialized unless `f`
    /// builds them; returning `None` drops the pair.
    pub fn cartesian_with<U, R, F>(&self, other: &[U], f: F) -> Dataset<R>
    where
        T: Sync,
        U: Sync,
        R: Send,
        F: Fn(&T, &U) -> Option<R> + Sync + Send,
    {
        let partitions = self
            .partitions
            .par_iter()
            .map(|partition| {
                partition
                    .iter()
                    .flat_map(|left| other.iter().filter_map(|right| f(left, right)))
                    .collect()
            })
            .collect();
        Dataset { partitions }
    }

    /// Redistribute elements into `num_partitions` balanced partitions, keeping order.
    pub fn repartition(self, num_partitions: usize) -> Self {
        Self::from_vec(self.collect(), num_partitions)
    }

    pub fn max_value<F>(&self, f: F) -> Option<f64>
    where
        T: Sync,
        F: Fn(&T) -> f64 + Sync + Send,
    {
        self.partitions
            .par_iter()
            .flat_map_iter(|partition| partition.iter().map(&f))
            .reduce_with(f64::max)
    }

    pub fn min_value<F>(&self, f: F) -> Option<f64>
    where
        T: Sync,
        F: Fn(&T) -> f64 + Sync + Send,
    {
        self.partitions
            .par_iter()
            .flat_map_iter(|partition| partition.iter().map(&f))
            .reduce_with(f64::min)
    }

    pub fn collect(self) -> Vec<T> {
        self.partitions.into_iter().flatten().collect()
    }
}

impl<K, V> Dataset<(K, V)>
where
    K: Ord + Send,
    V: Send,
{
    /// Group values by key. Groups come out in ascending key order and values
    /// keep their original relative order.
    pub fn group_by_key(self) -> Dataset<(K, Vec<V>)> {
        let num_partitions = self.num_partitions();
        let mut groups: BTreeMap<K, Vec<V>> = BTreeMap::new();
        for (key, value) in self.partitions.into_iter().flatten() {
            groups.entry(key).or_default().push(value);
        }
        Dataset::from_vec(groups.into_iter().collect(), num_partitions)
    }

    pub fn count_by_key(&self) -> BTreeMap<K, usize>
    where
        K: Clone + Sync,
        V: Sync,
    {
        self.partitions
            .par_iter()
            .map(|partition| {
                let mut counts = BTreeMap::new();
                for (key, _) in partition {
                    *counts.entry(key.clone()).or_insert(0) += 1;
                }
                counts
            })
            .reduce(BTreeMap::new, |mut acc, counts| {
                for (key, count) in counts {
                    *acc.entry(key).or_insert(0) += count;
                }
                acc
            })
    }

    /// Inner join against a broadcast copy of `other`. Keys without a partner
    /// on either side are dropped.
    pub fn join<W>(self, other: Dataset<(K, W)>) -> Dataset<(K, (V, W))>
    where
        K: Clone + Sync,
        V: Clone,
        W: Clone + Send + Sync,
    {
        let mut lookup: BTreeMap<K, Vec<W>> = BTreeMap::new();
        for (key, value) in other.collect() {
            lookup.entry(key).or_default().push(value);
        }

        self.flat_map(|(key, value)| {
            lookup
                .get(&key)
                .map(|matches| {
                    matches
                        .iter()
                        .map(|w| (key.clone(), (value.clone(), w.clone())))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        })
    }
}
