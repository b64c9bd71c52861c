//! Named run counters, merged across workers and printed by category.
use hashbrown::HashMap;
use std::io::{self, Write};

/// Counters keyed `"Category/Title"`. Each worker owns one instance; the
/// orchestrator merges them once the workers finish.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportStats {
    counters: HashMap<String, i64>,
    // value is (sum, count, min, max)
    float_distributions: HashMap<String, (f64, i64, f64, f64)>,
    percentages: HashMap<String, (i64, i64)>
}

impl TransportStats {
    pub fn new() -> TransportStats {
        TransportStats::default()
    }

    pub fn report_counter(&mut self, name: &str, val: i64) {
        match self.counters.get_mut(name) {
            Some(c) => *c += val,
            None => {
                self.counters.insert(name.to_owned(), val);
            }
        }
    }

    pub fn report_float_distribution(&mut self, name: &str, val: f64) {
        let distribution = self.float_distributions.entry(name.to_owned())
            .or_insert((0.0, 0, std::f64::INFINITY, std::f64::NEG_INFINITY));
        distribution.0 += val;
        distribution.1 += 1;
        distribution.2 = val.min(distribution.2);
        distribution.3 = val.max(distribution.3);
    }

    pub fn report_percentage(&mut self, name: &str, num: i64, denom: i64) {
        let percentage = self.percentages.entry(name.to_owned()).or_default();
        percentage.0 += num;
        percentage.1 += denom;
    }

    pub fn counter(&self, name: &str) -> i64 {
        self.counters.get(name).cloned().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &TransportStats) {
        for (name, val) in &other.counters {
            self.report_counter(name, *val);
        }
        for (name, other) in &other.float_distributions {
            let distribution = self.float_distributions.entry(name.clone())
                .or_insert((0.0, 0, std::f64::INFINITY, std::f64::NEG_INFINITY));
            distribution.0 += other.0;
            distribution.1 += other.1;
            distribution.2 = other.2.min(distribution.2);
            distribution.3 = other.3.max(distribution.3);
        }
        for (name, (num, denom)) in &other.percentages {
            self.report_percentage(name, *num, *denom);
        }
    }

    pub fn print<T: Write>(&self, dest: &mut T) -> io::Result<()> {
        let mut to_print: HashMap<&str, Vec<String>> = HashMap::default();

        for (counter, value) in &self.counters {
            let (category, title) = get_category_and_title(counter);
            to_print.entry(category).or_default().push(format!("{:<42}               {:12}", title, value));
        }

        for (counter, value) in &self.float_distributions {
            if value.1 == 0 {
                continue;
            }
            let (category, title) = get_category_and_title(counter);
            let avg = value.0 / value.1 as f64;
            to_print.entry(category).or_default().push(format!("{:<42}                      {:.3} avg [range {:.3} - {:.3}]", title, avg, value.2, value.3));
        }

        for (counter, value) in &self.percentages {
            if value.1 == 0 {
                continue;
            }
            let (category, title) = get_category_and_title(counter);
            let percent = value.0 as f64 * 100.0 / value.1 as f64;
            to_print.entry(category).or_default().push(format!("{:<42}{:12} {:12} ({:.2}%)", title, value.0, value.1, percent));
        }

        let mut categories: Vec<_> = to_print.into_iter().collect();
        categories.sort_by(|a, b| a.0.cmp(b.0));
        for (category, mut items) in categories {
            items.sort();
            writeln!(dest, "  {}", category)?;
            for item in items {
                writeln!(dest, "    {}", item)?;
            }
        }
        Ok(())
    }
}

#[inline]
pub fn get_category_and_title(s: &str) -> (&str, &str) {
    let mut split = s.splitn(2, '/');
    match (split.next(), split.next()) {
        (Some(category), Some(title)) => (category, title),
        (Some(title), None) => ("", title),
        _ => ("", "")
    }
}
