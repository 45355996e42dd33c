use std::num::NonZeroUsize;

use serde::Serialize;

use crate::core::error::BuildError;

/// 每页条目数，始终大于 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerPage(NonZeroUsize);

impl PerPage {
    /// 校验配置中的 `perpage`，0 或负数都是配置错误
    pub fn new(value: i64) -> Result<Self, BuildError> {
        usize::try_from(value)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(PerPage)
            .ok_or_else(|| BuildError::configuration(format!("perpage 必须是正整数，当前为 {}", value)))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// 分页中的一页
///
/// `number` 从 0 开始；`items` 借用原序列，不复制文章数据。
#[derive(Debug)]
pub struct Page<'a, T> {
    pub number: usize,
    pub items: &'a [T],
    pub total: usize,
}

impl<'a, T> Page<'a, T> {
    /// 面向读者的页码（从 1 开始）
    pub fn display_number(&self) -> usize {
        self.number + 1
    }

    pub fn has_prev(&self) -> bool {
        self.number > 0
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total
    }

    /// 供模板使用的分页信息
    pub fn pager(&self, base: &str) -> Pager {
        Pager {
            current: self.display_number(),
            total: self.total,
            prev: self.has_prev().then(|| page_url(base, self.number - 1)),
            next: self.has_next().then(|| page_url(base, self.number + 1)),
        }
    }
}

/// 模板上下文中的分页导航
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub current: usize,
    pub total: usize,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// 把有序序列切分成固定大小的页，最后一页可以更短
///
/// 页数为 ceil(N / perpage)，空序列没有页。
pub fn paginate<T>(items: &[T], perpage: PerPage) -> Vec<Page<'_, T>> {
    let total = (items.len() + perpage.get() - 1) / perpage.get();
    items
        .chunks(perpage.get())
        .enumerate()
        .map(|(number, items)| Page { number, items, total })
        .collect()
}

/// 某一页的输出文件路径，`base` 为空或以 `/` 结尾
///
/// 第一页是 `{base}index.html`，之后是 `{base}page/N/index.html`。
pub fn page_path(base: &str, number: usize) -> String {
    format!("{}index.html", page_url(base, number))
}

/// 某一页的目录 URL（相对于站点根目录）
pub fn page_url(base: &str, number: usize) -> String {
    if number == 0 {
        base.to_string()
    } else {
        format!("{}page/{}/", base, number + 1)
    }
}
