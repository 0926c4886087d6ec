//! The `goldencheck init` command.

use std::path::Path;

use anyhow::{Context, Result};

use goldencheck_core::config::STARTER_CONFIG;

use super::EXIT_PASS;

const CONFIG_PATH: &str = "goldencheck.toml";
const EXAMPLE_SUITE_PATH: &str = "golden/example-suite.json";

pub fn execute() -> Result<i32> {
    write_if_absent(Path::new(CONFIG_PATH), STARTER_CONFIG)?;

    std::fs::create_dir_all("golden").context("failed to create golden/")?;
    write_if_absent(Path::new(EXAMPLE_SUITE_PATH), EXAMPLE_SUITE)?;

    println!("\nNext steps:");
    println!("  1. Edit {EXAMPLE_SUITE_PATH} with your own cases");
    println!("  2. Run: goldencheck validate --suite {EXAMPLE_SUITE_PATH}");
    println!("  3. Run: goldencheck run --suite {EXAMPLE_SUITE_PATH} --responses-dir golden/responses");

    Ok(EXIT_PASS)
}

fn write_if_absent(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const EXAMPLE_SUITE: &str = r###"{
  "suite": "example-golden-suite",
  "version": 1,
  "templates": {
    "balance_report": {
      "required_sections": ["## 요약", "## 가정", "## 제안"],
      "max_assumptions": 3,
      "required_traits": [
        "수치 제안은 표 또는 수식 포함",
        "영향 지표(TTK/TTE/클리어율 등) 명시"
      ]
    }
  },
  "cases": [
    {
      "id": "EX01",
      "title": "Boss TTK tuning",
      "category": "combat",
      "prompt": "보스 HP를 20% 올리면 TTK가 어떻게 변하는지 분석해줘.",
      "expected_template": "balance_report",
      "required_keywords": ["TTK", "HP"],
      "required_references": ["combat-formulas.md"],
      "preferred_script": "ttk_calc.py"
    },
    {
      "id": "EX02",
      "title": "Currency sink review",
      "category": "economy",
      "prompt": "골드 싱크가 부족한 구간을 찾아 대응안을 제시해줘.",
      "expected_template": "balance_report",
      "required_keywords": ["골드", "싱크"],
      "required_references": []
    }
  ]
}
"###;
