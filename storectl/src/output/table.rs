use tabled::{Table, settings::Style};

/// Consistent styling for all tables printed by this tool
pub(crate) trait StorectlTable {
    fn styled(&mut self) -> &mut Self;
}

impl StorectlTable for Table {
    fn styled(&mut self) -> &mut Self {
        self.with(Style::psql())
    }
}
