//! 请求与响应 DTO

pub mod request;
pub mod response;

pub use request::{
    AdminSendRequest, EntityRefDto, NotificationQuery, PaginationParams, ReadAllRequest,
    ReadRequest, RegisterTokenRequest,
};

pub use response::{
    ApiResponse, DeviceDto, DispatchResultDto, NotificationDto, NotificationListDto, PageResponse,
    ReadResultDto,
};
