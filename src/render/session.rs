use crate::{
    descriptor::model::{OverlayResource, SessionMetadata, VideoAtlasLayout},
    foundation::error::AlphaResult,
    gpu::{
        context::GpuContext,
        geometry::QuadGeometry,
        program::ProgramCache,
        target::{FrameRgba, RenderTarget},
        textures::TextureManager,
    },
    render::packing::PlacementPacker,
};

#[derive(Debug)]
pub(crate) struct CachedBindGroup {
    pub(crate) program_generation: u64,
    pub(crate) texture_generation: u64,
    pub(crate) group: wgpu::BindGroup,
}

/// Every GPU object of one renderer session.
///
/// A session only exists fully configured. Dropping or [`Session::release`]-ing
/// the value is the whole teardown; a new session is built from scratch.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) ctx: GpuContext,
    pub(crate) target: RenderTarget,
    pub(crate) programs: ProgramCache,
    pub(crate) textures: TextureManager,
    pub(crate) geometry: QuadGeometry,
    pub(crate) sampler: wgpu::Sampler,
    pub(crate) packer: PlacementPacker,
    pub(crate) layout: VideoAtlasLayout,
    pub(crate) bind_group: Option<CachedBindGroup>,
}

impl Session {
    /// Build every GPU object for a prepared descriptor.
    ///
    /// On failure whatever was already created is released and no session exists.
    #[tracing::instrument(skip_all, fields(sources = resources.len()))]
    pub(crate) fn create(
        ctx: GpuContext,
        metadata: &SessionMetadata,
        resources: &[OverlayResource],
        width: u32,
        height: u32,
    ) -> AlphaResult<Self> {
        let mut programs = ProgramCache::default();
        let mut textures = TextureManager::default();
        let built = programs
            .build(&ctx, resources.len())
            .map(|_| ())
            .and_then(|()| textures.bind(&ctx, resources))
            .and_then(|()| RenderTarget::create(&ctx, width, height));
        let target = match built {
            Ok(target) => target,
            Err(err) => {
                programs.release();
                textures.release();
                return Err(err);
            }
        };

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("alphaframe_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let geometry = QuadGeometry::create(&ctx, &metadata.layout);
        Ok(Self {
            ctx,
            target,
            programs,
            textures,
            geometry,
            sampler,
            packer: PlacementPacker::new(resources.len()),
            layout: metadata.layout,
            bind_group: None,
        })
    }

    /// Reconfigure an existing session for a newly prepared descriptor.
    ///
    /// The program is built first; if that fails nothing else is touched.
    #[tracing::instrument(skip_all, fields(sources = resources.len()))]
    pub(crate) fn configure(
        &mut self,
        metadata: &SessionMetadata,
        resources: &[OverlayResource],
        width: u32,
        height: u32,
    ) -> AlphaResult<()> {
        let source_count = resources.len();
        self.programs.build(&self.ctx, source_count)?;
        self.bind_group = None;
        self.textures.bind(&self.ctx, resources)?;
        self.geometry.update(&self.ctx, &metadata.layout);

        if self.target.width != width || self.target.height != height {
            let target = RenderTarget::create(&self.ctx, width, height)?;
            std::mem::replace(&mut self.target, target).release();
        }

        self.packer = PlacementPacker::new(source_count);
        self.layout = metadata.layout;
        Ok(())
    }

    /// Blank the surface; no GPU object is released.
    pub(crate) fn clear(&self, rgba: [f64; 4]) {
        self.target.clear(&self.ctx, rgba);
    }

    pub(crate) fn read(&self) -> AlphaResult<FrameRgba> {
        self.target.read(&self.ctx)
    }

    /// Release every GPU object.
    pub(crate) fn release(mut self) {
        self.bind_group = None;
        self.programs.release();
        self.textures.release();
        self.geometry.release();
        self.target.release();
        tracing::debug!("session released");
    }
}
