//! Counterbalanced trial sequence for one participant.

use crate::error::ConfigurationError;
use crate::pool::ItemPools;
use menux_core::{ItemList, MenuKind, TaskKind, Trial};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Fixed scheduling parameters. The random source is passed to
/// [`TrialScheduler::schedule`] so runs can be reproduced from a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialScheduler {
    pub repeat_count: usize,
    pub item_count_cap: usize,
    /// Also shuffle the order items are displayed in, per condition.
    pub shuffle_menu_items: bool,
}

impl Default for TrialScheduler {
    fn default() -> Self {
        Self::new(3, 4)
    }
}

impl TrialScheduler {
    pub fn new(repeat_count: usize, item_count_cap: usize) -> Self {
        Self {
            repeat_count,
            item_count_cap,
            shuffle_menu_items: false,
        }
    }

    pub fn with_shuffled_items(mut self, shuffle: bool) -> Self {
        self.shuffle_menu_items = shuffle;
        self
    }

    /// Number of trials [`schedule`](Self::schedule) will produce for `pools`.
    pub fn expected_len(&self, pools: &ItemPools) -> usize {
        let per_menu: usize = TaskKind::ALL
            .iter()
            .filter_map(|&task| pools.get(task))
            .map(|items| self.item_count_cap.min(items.len()) * self.repeat_count)
            .sum();
        per_menu * MenuKind::ALL.len()
    }

    /// Builds the full ordered sequence.
    ///
    /// Menu order is shuffled once; task order is reshuffled for every menu.
    /// Within a (menu, task) block the prompted items are the first
    /// `min(cap, len)` entries of a random permutation of the pool, each
    /// repeated `repeat_count` times. Prompts are tracked by pool position so
    /// duplicate labels stay distinct.
    pub fn schedule<R: Rng + ?Sized>(
        &self,
        participant: u32,
        pools: &ItemPools,
        rng: &mut R,
    ) -> Result<Vec<Trial>, ConfigurationError> {
        pools.validate()?;

        let mut menus = MenuKind::ALL;
        menus.shuffle(rng);

        let mut trials = Vec::with_capacity(self.expected_len(pools));
        for menu in menus {
            let mut tasks = TaskKind::ALL;
            tasks.shuffle(rng);

            for task in tasks {
                let pool = pools.require(task)?;

                let mut prompts: Vec<usize> = (0..pool.len()).collect();
                prompts.shuffle(rng);
                prompts.truncate(self.item_count_cap.min(pool.len()));

                let (items, display) = self.displayed(pool, rng);

                for &source in &prompts {
                    // position of the pool entry in the displayed list
                    let prompted = display
                        .iter()
                        .position(|&i| i == source)
                        .unwrap_or(source);
                    for repeat in 0..self.repeat_count {
                        trials.push(Trial::new(
                            menu,
                            task,
                            items.clone(),
                            prompted,
                            repeat,
                            trials.len(),
                            participant,
                        )?);
                    }
                }
                debug!(%menu, %task, prompts = prompts.len(), "scheduled block");
            }
        }

        debug!(participant, trials = trials.len(), "schedule ready");
        Ok(trials)
    }

    /// The list a block's menus show, and for each displayed slot the pool
    /// index it came from.
    fn displayed<R: Rng + ?Sized>(&self, pool: &ItemList, rng: &mut R) -> (ItemList, Vec<usize>) {
        let mut order: Vec<usize> = (0..pool.len()).collect();
        if !self.shuffle_menu_items {
            return (pool.clone(), order);
        }
        order.shuffle(rng);
        (pool.permuted(&order), order)
    }
}
