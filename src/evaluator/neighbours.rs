/// One stored neighbour: its distance from the reference instance and its index in the dataset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct NeighbourEntry {
    /// The distance from the reference instance.
    pub distance: f64,
    /// The dataset index of the neighbour.
    pub instance: usize,
}

/// The neighbours stored for one class and the slot of the current worst entry.
#[derive(Clone, Debug)]
struct ClassNeighbours {
    entries: Vec<NeighbourEntry>,
    worst: usize,
}

/// The K nearest instances of each class seen so far for one reference instance. Offers beyond
/// the K-th entry replace the current worst entry in place when they are strictly closer, so one
/// pass over the dataset leaves each class with its K nearest neighbours.
#[derive(Debug)]
pub(crate) struct NeighbourTable {
    k: usize,
    classes: Vec<ClassNeighbours>,
}

impl NeighbourTable {
    /// Create an empty table.
    ///
    /// # Arguments
    ///
    /// * `number_of_classes`: The number of classes of the dataset.
    /// * `k`: The maximum number of neighbours to keep per class.
    ///
    /// returns: `NeighbourTable`
    pub fn new(number_of_classes: usize, k: usize) -> Self {
        Self {
            k,
            classes: vec![
                ClassNeighbours {
                    entries: Vec::with_capacity(k),
                    worst: 0,
                };
                number_of_classes
            ],
        }
    }

    /// Clear all classes. The entry storage is kept so a reset does not allocate.
    pub fn reset(&mut self) {
        for class in &mut self.classes {
            class.entries.clear();
            class.worst = 0;
        }
    }

    /// Offer a neighbour to the table of its class. While the class holds fewer than K entries
    /// the neighbour is appended; afterwards it replaces the worst stored entry when it is
    /// strictly closer, and is dropped otherwise.
    ///
    /// # Arguments
    ///
    /// * `class`: The class of the offered instance.
    /// * `distance`: The distance from the reference instance.
    /// * `instance`: The dataset index of the offered instance.
    pub fn offer(&mut self, class: usize, distance: f64, instance: usize) {
        let class = &mut self.classes[class];
        if class.entries.len() < self.k {
            class.entries.push(NeighbourEntry { distance, instance });
            Self::rescan(class);
        } else if distance < class.entries[class.worst].distance {
            class.entries[class.worst] = NeighbourEntry { distance, instance };
            Self::rescan(class);
        }
    }

    /// Recompute the worst slot of a class. Ties keep the first maximum encountered, which pins
    /// the worst pointer when duplicate distances exist.
    fn rescan(class: &mut ClassNeighbours) {
        let mut worst_distance = -1.0;
        for (slot, entry) in class.entries.iter().enumerate() {
            if entry.distance > worst_distance {
                worst_distance = entry.distance;
                class.worst = slot;
            }
        }
    }

    /// Get the number of neighbours stored for a class.
    ///
    /// # Arguments
    ///
    /// * `class`: The class index.
    ///
    /// returns: `usize`
    pub fn stored(&self, class: usize) -> usize {
        self.classes[class].entries.len()
    }

    /// Get the stored neighbours of a class, in insertion/replacement order.
    ///
    /// # Arguments
    ///
    /// * `class`: The class index.
    ///
    /// returns: `&[NeighbourEntry]`
    pub fn entries(&self, class: usize) -> &[NeighbourEntry] {
        &self.classes[class].entries
    }
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;

    use crate::evaluator::neighbours::NeighbourTable;

    /// The largest stored distance of a class.
    fn worst_distance(table: &NeighbourTable, class: usize) -> f64 {
        table
            .entries(class)
            .iter()
            .map(|e| e.distance)
            .fold(-1.0, f64::max)
    }

    #[test]
    /// Entries accumulate until K and the population never exceeds it.
    fn test_population_is_bounded() {
        let mut table = NeighbourTable::new(1, 3);
        for (instance, distance) in [4.0, 2.0, 3.0, 1.0, 5.0].iter().enumerate() {
            table.offer(0, *distance, instance);
            assert!(table.stored(0) <= 3);
        }
        assert_eq!(table.stored(0), 3);
    }

    #[test]
    /// A closer offer replaces the worst entry in place; a farther offer is dropped.
    fn test_replace_worst() {
        let mut table = NeighbourTable::new(1, 2);
        table.offer(0, 4.0, 10);
        table.offer(0, 2.0, 11);

        // farther than the worst entry: no change
        table.offer(0, 9.0, 12);
        let instances: Vec<usize> = table.entries(0).iter().map(|e| e.instance).collect();
        assert_eq!(instances, vec![10, 11]);

        // closer than the worst entry: instance 10 (distance 4) is overwritten
        table.offer(0, 1.0, 13);
        let instances: Vec<usize> = table.entries(0).iter().map(|e| e.instance).collect();
        assert_eq!(instances, vec![13, 11]);
        assert_approx_eq!(f64, worst_distance(&table, 0), 2.0);
    }

    #[test]
    /// With duplicate distances the first maximum is the one replaced, so duplicates are evicted
    /// in slot order.
    fn test_ties_keep_first_maximum() {
        let mut table = NeighbourTable::new(1, 3);
        table.offer(0, 5.0, 20);
        table.offer(0, 5.0, 21);
        table.offer(0, 5.0, 22);

        table.offer(0, 1.0, 23);
        let instances: Vec<usize> = table.entries(0).iter().map(|e| e.instance).collect();
        assert_eq!(instances, vec![23, 21, 22]);

        table.offer(0, 2.0, 24);
        let instances: Vec<usize> = table.entries(0).iter().map(|e| e.instance).collect();
        assert_eq!(instances, vec![23, 24, 22]);
    }

    #[test]
    /// Every offered instance lands in the table of its own class and a reset empties all
    /// classes without losing capacity.
    fn test_classes_are_independent() {
        let mut table = NeighbourTable::new(3, 2);
        table.offer(0, 1.0, 0);
        table.offer(1, 2.0, 1);
        table.offer(1, 3.0, 2);
        table.offer(2, 4.0, 3);

        assert_eq!(table.stored(0), 1);
        assert_eq!(table.stored(1), 2);
        assert_eq!(table.stored(2), 1);

        table.reset();
        for class in 0..3 {
            assert_eq!(table.stored(class), 0);
        }
    }

    #[test]
    /// When K is at least the class population, every offered instance is kept.
    fn test_k_larger_than_population() {
        let mut table = NeighbourTable::new(1, 10);
        for instance in 0..6 {
            table.offer(0, instance as f64, instance);
        }
        assert_eq!(table.stored(0), 6);
        assert_approx_eq!(f64, worst_distance(&table, 0), 5.0);
    }
}
