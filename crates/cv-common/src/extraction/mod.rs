//! 正規化済みテキストから項目ごとに値を拾う抽出器群
//!
//! どの関数も入力テキストだけを見る純粋関数で、見つからなければ空文字・空 Vec・`None` を返す。

pub mod certifications;
pub mod contact;
pub mod education;
pub mod experience;
pub mod generic;
pub mod signals;
pub mod skills;

pub use certifications::extract_certifications;
pub use contact::{
    extract_contact_info, extract_emails, extract_from_email, extract_github, extract_linkedin,
    extract_name, extract_phones, extract_portfolio, split_signature,
};
pub use education::extract_education;
pub use experience::extract_work_experience;
pub use skills::extract_skills;
