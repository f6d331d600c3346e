//! Common test utilities

use complaint_lens::analytics::{Classifier, MatchMode, Pipeline};
use complaint_lens::models::{Category, CellValue, Dataset};

/// Text column of the fixture datasets
pub const TEXT_COLUMN: &str = "Текст обращения";

/// Date column of the fixture datasets
pub const DATE_COLUMN: &str = "Дата";

/// Categories with the short keyword lists used throughout the tests
pub fn scenario_categories() -> Vec<Category> {
    vec![
        Category::new("admin", "Регистратура / Администратор", ["регистрат", "касса"])
            .unwrap()
            .with_sheet_name("Регистратура_Администратор"),
        Category::new("wait", "Ожидание / Очередь", ["ждал", "долго"])
            .unwrap()
            .with_sheet_name("Ожидание_Очередь"),
    ]
}

/// Five complaints: rows 1 and 3 are about the front desk, rows 1 and 5
/// about waiting
pub fn scenario_dataset() -> Dataset {
    Dataset::new(
        vec!["№".into(), DATE_COLUMN.into(), TEXT_COLUMN.into()],
        vec![
            vec![
                CellValue::Int(1),
                "2024-01-15".into(),
                "Долго ждали в регистратуре".into(),
            ],
            vec![CellValue::Int(2), "2024-01-20".into(), "Все хорошо".into()],
            vec![
                CellValue::Int(3),
                "2024-02-03".into(),
                "касса не работает".into(),
            ],
            vec![
                CellValue::Int(4),
                "2024-02-10".into(),
                "кассация чека".into(),
            ],
            vec![
                CellValue::Int(5),
                "2024-03-01".into(),
                "Очень долго".into(),
            ],
        ],
    )
}

/// Pipeline over the scenario categories
#[allow(dead_code)]
pub fn scenario_pipeline(mode: MatchMode) -> Pipeline {
    Pipeline::new(Classifier::new(&scenario_categories(), mode).unwrap())
}
