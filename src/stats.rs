use std::time::Duration;

/// 单次整页翻译的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub nodes_collected: usize,
    pub chunks_created: usize,
    pub windows_completed: usize,
    pub nodes_translated: usize,
    pub overlays_created: usize,
    pub overlays_removed: usize,
    pub nodes_untranslated: usize,
    pub translation_time: Duration,
}

/// 打印性能统计
pub fn print_performance_stats(stats: &PipelineStats, total_duration: Duration) {
    println!("\n📊 性能统计报告:");
    println!("═══════════════════════════════════════");

    // 时间分解
    println!("⏱️  时间分解:");
    println!("   翻译执行: {}", format_duration(stats.translation_time));
    println!("   总耗时: {}", format_duration(total_duration));

    // 翻译统计
    println!("\n🔤 翻译统计:");
    println!("   收集文本节点: {} 个", stats.nodes_collected);
    println!("   创建分块: {} 个", stats.chunks_created);
    println!("   完成窗口: {} 个", stats.windows_completed);
    println!("   替换节点: {} 个", stats.nodes_translated);
    println!("   下方译文: {} 个", stats.overlays_created);
    if stats.overlays_removed > 0 {
        println!("   清理旧译文: {} 个", stats.overlays_removed);
    }

    // 译文行数不足的节点
    if stats.nodes_untranslated > 0 {
        println!("\n⚠️  未翻译节点: {} 个 (译文行数少于原文)", stats.nodes_untranslated);
    }

    let coverage = stats.coverage() * 100.0;
    println!("\n🚀 覆盖率: {:.1}%", coverage);
}

impl PipelineStats {
    /// 已写回译文的节点占比
    pub fn coverage(&self) -> f64 {
        if self.nodes_collected == 0 {
            return 0.0;
        }
        (self.nodes_translated + self.overlays_created) as f64 / self.nodes_collected as f64
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn test_coverage() {
        let stats = PipelineStats {
            nodes_collected: 4,
            nodes_translated: 3,
            ..Default::default()
        };
        assert!((stats.coverage() - 0.75).abs() < f64::EPSILON);
        assert_eq!(PipelineStats::default().coverage(), 0.0);
    }
}
