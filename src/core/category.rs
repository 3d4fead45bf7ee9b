use serde::Serialize;

/// Topic band of a question; national and local exams group their sixty
/// questions into ten runs of six.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Stoichiometry,
    Descriptive,
    States,
    Thermodynamics,
    Kinetics,
    Equilibrium,
    Redox,
    Atomic,
    Bonding,
    Organic,
}

const QUESTIONS_PER_CATEGORY: u32 = 6;

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Stoichiometry,
        Category::Descriptive,
        Category::States,
        Category::Thermodynamics,
        Category::Kinetics,
        Category::Equilibrium,
        Category::Redox,
        Category::Atomic,
        Category::Bonding,
        Category::Organic,
    ];

    pub fn for_question(number: u32) -> Option<Self> {
        if number == 0 {
            return None;
        }
        let idx = ((number - 1) / QUESTIONS_PER_CATEGORY) as usize;
        Self::ALL.get(idx).copied()
    }

    /// Inclusive question-number range of this band.
    pub fn range(&self) -> (u32, u32) {
        let first = *self as u32 * QUESTIONS_PER_CATEGORY + 1;
        (first, first + QUESTIONS_PER_CATEGORY - 1)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Stoichiometry => "Stoichiometry/Solutions",
            Category::Descriptive => "Descriptive/Laboratory",
            Category::States => "States of Matter",
            Category::Thermodynamics => "Thermodynamics",
            Category::Kinetics => "Kinetics",
            Category::Equilibrium => "Equilibrium",
            Category::Redox => "Oxidation-Reduction",
            Category::Atomic => "Atomic Structure/Periodicity",
            Category::Bonding => "Bonding/Molecular Structure",
            Category::Organic => "Organic/Biochemistry",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_sixty_questions() {
        assert_eq!(Category::for_question(1), Some(Category::Stoichiometry));
        assert_eq!(Category::for_question(6), Some(Category::Stoichiometry));
        assert_eq!(Category::for_question(7), Some(Category::Descriptive));
        assert_eq!(Category::for_question(60), Some(Category::Organic));
        assert_eq!(Category::for_question(61), None);
        assert_eq!(Category::for_question(0), None);
    }

    #[test]
    fn ranges_match_bands() {
        assert_eq!(Category::Kinetics.range(), (25, 30));
        assert_eq!(Category::Organic.range(), (55, 60));
    }
}
