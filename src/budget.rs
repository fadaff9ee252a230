use std::sync::Arc;

use parking_lot::Mutex;

/// Extrusion material available, shared between the worker (debits) and
/// the producers (credits). Every update happens under the lock so no
/// credited units are lost to a racing debit.
#[derive(Debug, Clone, Default)]
pub struct Budget
{
    units: Arc<Mutex<f64>>
}

impl Budget
{
    pub fn new(initial: f64) -> Budget
    {
        Budget { units: Arc::new(Mutex::new(initial)) }
    }

    pub fn get(&self) -> f64
    {
        *self.units.lock()
    }

    /// Returns the new total. Non-finite amounts are ignored.
    pub fn credit(&self, amount: f64) -> f64
    {
        let mut units = self.units.lock();
        if amount.is_finite() {
            *units += amount;
        }
        *units
    }

    /// May leave the budget negative
    pub fn debit(&self, amount: f64) -> f64
    {
        let mut units = self.units.lock();
        *units -= amount;
        *units
    }

    pub fn covers(&self, amount: f64) -> bool
    {
        self.get() >= amount
    }
}

#[test]
fn concurrent_credits_are_not_lost()
{
    let budget = Budget::new(0.0);
    let threads: Vec<_> = (0..8).map(|_| {
        let b = budget.clone();
        std::thread::spawn(move || {
            for _ in 0..1000 {
                b.credit(1.0);
                b.debit(0.5);
            }
        })
    }).collect();
    for t in threads {
        t.join().unwrap();
    }
    assert_eq!(budget.get(), 4000.0);
}
