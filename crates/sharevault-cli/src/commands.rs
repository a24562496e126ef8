//! 子命令实现

use anyhow::Result;
use sharevault_core::{
    ClientSettings, DirectorySaver, HttpTransferClient, SelectedFile, TransferController,
    TransferError,
};
use std::path::{Path, PathBuf};

type Controller = TransferController<HttpTransferClient, DirectorySaver>;

fn controller(settings: &ClientSettings) -> Result<Controller> {
    let api = HttpTransferClient::new(settings)?;
    let saver = DirectorySaver::new(settings.download_dir.clone());
    Ok(TransferController::new(api, saver))
}

/// 把传输错误打印出来并转换为退出码非零的错误
fn report(err: TransferError) -> anyhow::Error {
    eprintln!("❌ {}", err);
    anyhow::Error::new(err)
}

pub async fn upload(settings: &ClientSettings, path: &Path, password: String) -> Result<()> {
    let file = SelectedFile::from_path(path).await.map_err(|e| {
        eprintln!("❌ 无法读取文件 {}: {}", path.display(), e);
        e
    })?;

    println!(
        "📤 上传: {} ({} bytes, {}) -> {}",
        file.name,
        file.size(),
        file.mime_type,
        settings.api_base()
    );

    let mut controller = controller(settings)?;
    controller.select_file(file);
    controller.set_upload_password(password);

    let file_id = controller.upload().await.map_err(report)?;

    println!("✅ 上传成功");
    println!("   文件 ID: {}", file_id);
    if !controller.state().upload_password.is_empty() {
        println!("   密码: {}", controller.state().upload_password);
    }
    Ok(())
}

pub async fn download(settings: &ClientSettings, file_id: String, password: String) -> Result<()> {
    println!("📥 下载: {} (保存到: {})", file_id, settings.download_dir.display());

    let mut controller = controller(settings)?;
    controller.set_file_identifier(file_id);
    controller.set_download_password(password);

    let path = controller.download().await.map_err(report)?;

    println!("✅ 已保存: {}", path.display());
    Ok(())
}

pub fn show_config(settings: &ClientSettings) {
    println!("配置文件: {}", ClientSettings::config_path().display());
    println!("后端地址: {}", settings.api_base());
    println!("下载目录: {}", settings.download_dir.display());
    println!("详细日志: {}", settings.verbose);
}

pub fn set_api(url: String) -> Result<()> {
    let mut settings = ClientSettings::load_stored();
    settings.api_base = url;
    settings.save()?;
    println!("✅ 后端地址已更新为: {}", settings.api_base());
    Ok(())
}

pub fn set_download_dir(dir: PathBuf) -> Result<()> {
    let mut settings = ClientSettings::load_stored();
    settings.download_dir = dir;
    settings.save()?;
    println!("✅ 下载目录已更新为: {}", settings.download_dir.display());
    Ok(())
}
