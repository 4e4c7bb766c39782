mod file_dto;

pub use file_dto::{
    ListFilesResponseDto, ProfileImageFieldsDto, ProfileImageUploadDto,
    ProfileImageUploadResponseDto, UploadCallbackDto, UploadCompleteResponseDto,
    WebUploadQueryDto, WebUploadRequestDto,
};
