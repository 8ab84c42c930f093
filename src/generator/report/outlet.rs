use std::path::{Path, PathBuf};

use crate::config::Config;

/// 把报告写到输出目录
pub struct DiskOutlet {
    report_path: PathBuf,
    summary_path: PathBuf,
}

impl DiskOutlet {
    pub fn new(config: &Config) -> Self {
        Self {
            report_path: config.report_path(),
            summary_path: config.summary_path(),
        }
    }

    /// 写出报告和概要文档，返回两者路径
    pub async fn save(&self, report: &str, summary: &str) -> std::io::Result<(PathBuf, PathBuf)> {
        write_artifact(&self.report_path, report).await?;
        println!("💾 已保存报告: {}", self.report_path.display());

        write_artifact(&self.summary_path, summary).await?;
        println!("💾 已保存运行概要: {}", self.summary_path.display());

        Ok((self.report_path.clone(), self.summary_path.clone()))
    }
}

/// 确保父目录存在后写入
pub async fn write_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_creates_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            output_path: temp_dir.path().join("nested").join("outputs"),
            ..Default::default()
        };
        let outlet = DiskOutlet::new(&config);
        let (report, summary) = outlet.save("# brief", "# summary").await.unwrap();

        assert_eq!(report, config.report_path());
        assert_eq!(std::fs::read_to_string(report).unwrap(), "# brief");
        assert_eq!(std::fs::read_to_string(summary).unwrap(), "# summary");
    }
}
